//! Minimal flat JSON object encoder used for report bodies.
//!
//! The collector expects numeric-looking values as bare JSON numbers and
//! everything else as strings. A value ending in `0` is always sent as a
//! string unless it is exactly `"0"`, so `"10"` and `"2.50"` go out quoted.

use std::fmt::Write;

use crate::models::ReportPayload;

/// Encode `payload` as a single-level JSON object in insertion order.
pub fn encode(payload: &ReportPayload) -> String {
    let mut json = String::with_capacity(1024);
    json.push('{');
    for (index, (key, value)) in payload.iter().enumerate() {
        if index > 0 {
            json.push(',');
        }
        json.push_str(&escape(key));
        json.push(':');
        if is_numeric(value) {
            json.push_str(value);
        } else {
            json.push_str(&escape(value));
        }
    }
    json.push('}');
    json
}

/// Whether `value` is emitted as a bare number.
pub fn is_numeric(value: &str) -> bool {
    if value != "0" && value.ends_with('0') {
        return false;
    }
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Quote and escape `text` as a JSON string literal.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c < ' ' => {
                // Writing into a String cannot fail.
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
