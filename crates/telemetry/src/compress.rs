//! Gzip compression of encoded report bodies.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use metrics_lite_core::error::{MetricsError, Result};

/// Gzip-compress `input` in one shot.
pub fn gzip(input: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(input.len() / 2), Compression::default());
    encoder
        .write_all(input)
        .map_err(|e| MetricsError::Encoding(format!("failed to compress payload: {e}")))?;
    encoder
        .finish()
        .map_err(|e| MetricsError::Encoding(format!("failed to finish compression: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn gzip_output_has_gzip_magic() {
        let compressed = gzip(b"{\"guid\":\"abc\"}").unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn gzip_decompresses_to_input() {
        let input = br#"{"guid":"abc","players_online":7}"#;
        let compressed = gzip(input).unwrap();

        let mut decoded = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn gzip_handles_empty_input() {
        let compressed = gzip(b"").unwrap();
        assert!(!compressed.is_empty());
    }
}
