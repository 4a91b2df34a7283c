//! Report delivery: one gzip-encoded HTTP POST per report.

use std::sync::Arc;
use std::time::Duration;

use metrics_lite_core::config::DEFAULT_BASE_URL;
use metrics_lite_core::error::{MetricsError, Result};
use reqwest::header::{ACCEPT, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};

/// Collector protocol revision announced in the User-Agent.
pub const REVISION: u32 = 7;

/// Report path prefix; the encoded plugin name follows it.
const REPORT_PATH: &str = "/plugin/";

/// Default HTTP timeout for a single exchange.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable that forces a direct, proxy-less connection.
pub const BYPASS_PROXY_ENV: &str = "METRICS_LITE_BYPASS_PROXY";

/// Detects a proxy-injecting component in the host process. Such components
/// do not forward POST bodies, so reports must go around them.
pub trait ProxyProbe: Send + Sync {
    fn proxy_injector_present(&self) -> bool;
}

impl<F> ProxyProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn proxy_injector_present(&self) -> bool {
        self()
    }
}

/// Probe for hosts that never inject a proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxyInjector;

impl ProxyProbe for NoProxyInjector {
    fn proxy_injector_present(&self) -> bool {
        false
    }
}

/// Probe driven by [`BYPASS_PROXY_ENV`]: any of `1`, `true`, `yes` bypasses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProxyProbe;

impl ProxyProbe for EnvProxyProbe {
    fn proxy_injector_present(&self) -> bool {
        std::env::var(BYPASS_PROXY_ENV)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}

/// HTTP client for the collection endpoint.
#[derive(Clone)]
pub struct TransportClient {
    base_url: String,
    timeout: Duration,
    proxy_probe: Arc<dyn ProxyProbe>,
}

impl TransportClient {
    /// Create a client targeting the default collection endpoint.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            proxy_probe: Arc::new(NoProxyInjector),
        }
    }

    /// Override the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy_probe(mut self, probe: Arc<dyn ProxyProbe>) -> Self {
        self.proxy_probe = probe;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full report URL for `plugin_name`.
    pub fn report_url(&self, plugin_name: &str) -> String {
        format!("{}{}{}", self.base_url, REPORT_PATH, encode_name(plugin_name))
    }

    /// POST a gzip-compressed JSON body and classify the first response line.
    ///
    /// Returns the first line on success. Network faults and non-2xx
    /// statuses fail with [`MetricsError::Transport`]; error lines from the
    /// collector fail with [`MetricsError::Protocol`].
    pub async fn send(&self, plugin_name: &str, body: Vec<u8>) -> Result<String> {
        let url = self.report_url(plugin_name);

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(format!("MCStats/{REVISION}"));
        if self.proxy_probe.proxy_injector_present() {
            tracing::debug!("proxy injector detected, using a direct connection");
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        let response = client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "gzip")
            .header(CONTENT_LENGTH, body.len())
            .header(ACCEPT, "application/json")
            .header(CONNECTION, "close")
            .body(body)
            .send()
            .await
            .map_err(|e| MetricsError::Transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::Transport(format!(
                "collector returned {status} for {url}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| MetricsError::Transport(format!("failed to read response: {e}")))?;

        let line = first_line(&text);
        classify_response(line)?;
        Ok(line.unwrap_or_default().to_string())
    }
}

impl Default for TransportClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Form-style UTF-8 percent encoding: spaces become `+`, `*` stays bare and
/// `~` is escaped.
fn encode_name(name: &str) -> String {
    urlencoding::encode(name)
        .replace('~', "%7E")
        .replace("%20", "+")
        .replace("%2A", "*")
}

/// First line of a response body, or `None` for an empty body.
fn first_line(body: &str) -> Option<&str> {
    if body.is_empty() {
        return None;
    }
    body.split(|c: char| c == '\n' || c == '\r').next()
}

/// Decide whether a response line signals an error.
///
/// An absent line fails with `null`, a line starting with `ERR` fails with
/// the whole line, and a line starting with `7` fails with the rest of the
/// line after `7` or `7,`.
pub fn classify_response(line: Option<&str>) -> Result<()> {
    let Some(line) = line else {
        return Err(MetricsError::Protocol("null".to_string()));
    };

    if line.starts_with("ERR") {
        return Err(MetricsError::Protocol(line.to_string()));
    }

    if let Some(rest) = line.strip_prefix('7') {
        let message = rest.strip_prefix(',').unwrap_or(rest);
        return Err(MetricsError::Protocol(message.to_string()));
    }

    Ok(())
}
