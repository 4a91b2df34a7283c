//! TOML-based host settings for metrics-lite.

use crate::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default collection endpoint authority.
pub const DEFAULT_BASE_URL: &str = "http://report.mcstats.org";

/// Longest accepted ping interval (one week).
pub const MAX_PING_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Longest accepted request timeout (ten minutes).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Top-level settings, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteConfig {
    pub reporter: ReporterSection,
}

/// Identity of the reporting plugin and how reports are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterSection {
    pub plugin_name: String,
    pub plugin_version: String,
    /// Root directory holding the scoped `Metrics.cfg` stores.
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_ping_interval")]
    pub ping_interval_minutes: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Always use a direct connection, ignoring any system proxy.
    #[serde(default)]
    pub bypass_proxy: bool,
}

fn default_config_dir() -> String {
    "config".into()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_ping_interval() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    30
}

impl LiteConfig {
    /// Load settings from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| MetricsError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the settings, returning an error for unusable values.
    pub fn validate(&self) -> Result<()> {
        let reporter = &self.reporter;

        if reporter.plugin_name.trim().is_empty() {
            return Err(MetricsError::Config(
                "reporter.plugin_name must not be empty".into(),
            ));
        }

        if reporter.plugin_version.trim().is_empty() {
            return Err(MetricsError::Config(
                "reporter.plugin_version must not be empty".into(),
            ));
        }

        if !(reporter.base_url.starts_with("http://") || reporter.base_url.starts_with("https://"))
        {
            return Err(MetricsError::Config(format!(
                "reporter.base_url must be an http(s) URL: {}",
                reporter.base_url
            )));
        }

        if reporter.ping_interval_minutes == 0
            || reporter.ping_interval_minutes > MAX_PING_INTERVAL_MINUTES
        {
            return Err(MetricsError::Config(format!(
                "reporter.ping_interval_minutes must be between 1 and {MAX_PING_INTERVAL_MINUTES}"
            )));
        }

        if reporter.request_timeout_secs == 0
            || reporter.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(MetricsError::Config(format!(
                "reporter.request_timeout_secs must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}"
            )));
        }

        Ok(())
    }

    /// Generate a sensible default configuration for the given plugin.
    pub fn generate_default(plugin_name: &str, plugin_version: &str, config_dir: &str) -> Self {
        Self {
            reporter: ReporterSection {
                plugin_name: plugin_name.into(),
                plugin_version: plugin_version.into(),
                config_dir: config_dir.into(),
                base_url: default_base_url(),
                ping_interval_minutes: default_ping_interval(),
                request_timeout_secs: default_request_timeout(),
                bypass_proxy: false,
            },
        }
    }

    /// Serialize the settings back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MetricsError::Config(format!("failed to serialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TOML: &str = r#"
[reporter]
plugin_name = "WorldGuard"
plugin_version = "6.2.1"
config_dir = "/srv/minecraft/config"
base_url = "https://stats.example.org"
ping_interval_minutes = 30
request_timeout_secs = 10
bypass_proxy = true
"#;

    fn parse_sample() -> LiteConfig {
        toml::from_str(SAMPLE_TOML).expect("sample TOML should parse")
    }

    #[test]
    fn parse_full_config() {
        let cfg = parse_sample();
        assert_eq!(cfg.reporter.plugin_name, "WorldGuard");
        assert_eq!(cfg.reporter.plugin_version, "6.2.1");
        assert_eq!(cfg.reporter.config_dir, "/srv/minecraft/config");
        assert_eq!(cfg.reporter.base_url, "https://stats.example.org");
        assert_eq!(cfg.reporter.ping_interval_minutes, 30);
        assert_eq!(cfg.reporter.request_timeout_secs, 10);
        assert!(cfg.reporter.bypass_proxy);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let minimal = r#"
[reporter]
plugin_name = "Test"
plugin_version = "1.0"
"#;
        let cfg: LiteConfig = toml::from_str(minimal).expect("minimal config should parse");
        assert_eq!(cfg.reporter.config_dir, "config");
        assert_eq!(cfg.reporter.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.reporter.ping_interval_minutes, 15);
        assert_eq!(cfg.reporter.request_timeout_secs, 30);
        assert!(!cfg.reporter.bypass_proxy);
        cfg.validate().expect("minimal config should be valid");
    }

    #[test]
    fn roundtrip_serialization() {
        let cfg = parse_sample();
        let serialized = cfg.to_toml().expect("should serialize");
        let deserialized: LiteConfig =
            toml::from_str(&serialized).expect("should deserialize roundtrip");
        assert_eq!(deserialized.reporter.plugin_name, cfg.reporter.plugin_name);
        assert_eq!(deserialized.reporter.base_url, cfg.reporter.base_url);
    }

    #[test]
    fn generate_default_is_valid() {
        let cfg = LiteConfig::generate_default("Demo", "0.1.0", "config");
        cfg.validate().expect("default config should be valid");
    }

    #[test]
    fn validate_requires_plugin_name() {
        let mut cfg = parse_sample();
        cfg.reporter.plugin_name = "  ".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("plugin_name"));
    }

    #[test]
    fn validate_requires_plugin_version() {
        let mut cfg = parse_sample();
        cfg.reporter.plugin_version = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let mut cfg = parse_sample();
        cfg.reporter.base_url = "ftp://report.example.org".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut cfg = parse_sample();
        cfg.reporter.ping_interval_minutes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_interval() {
        let mut cfg = parse_sample();
        cfg.reporter.ping_interval_minutes = u64::MAX;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("ping_interval_minutes"));

        cfg.reporter.ping_interval_minutes = MAX_PING_INTERVAL_MINUTES;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_oversized_timeout() {
        let mut cfg = parse_sample();
        cfg.reporter.request_timeout_secs = MAX_REQUEST_TIMEOUT_SECS + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = parse_sample();
        cfg.reporter.request_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics-lite.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let cfg = LiteConfig::load(&path).expect("should load from file");
        assert_eq!(cfg.reporter.plugin_name, "WorldGuard");
    }

    #[test]
    fn load_nonexistent_file_returns_io_error() {
        let result = LiteConfig::load(Path::new("/nonexistent/metrics-lite.toml"));
        assert!(matches!(result, Err(MetricsError::Io(_))));
    }

    #[test]
    fn load_invalid_toml_returns_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is [[[not valid toml").unwrap();

        let result = LiteConfig::load(&path);
        assert!(matches!(result, Err(MetricsError::Config(_))));
    }
}
