pub mod init;
pub mod opt;
pub mod post;
pub mod run;
pub mod status;

use std::path::Path;
use std::sync::Arc;

use metrics_lite_core::config::LiteConfig;
use metrics_lite_core::gate::{MetricsPaths, ServerScope};
use metrics_lite_telemetry::{EnvProxyProbe, Reporter, StaticHost};
use tracing::info;

/// Load and validate the settings file.
fn load_config(config_path: &str) -> anyhow::Result<LiteConfig> {
    let config = LiteConfig::load(Path::new(config_path))?;
    config.validate()?;
    info!("Loaded configuration from {}", config_path);
    Ok(config)
}

/// Open both scoped stores and build a reporter for the configured plugin.
fn open_reporter(config: &LiteConfig, host: StaticHost) -> anyhow::Result<Reporter> {
    let paths = MetricsPaths::new(&config.reporter.config_dir);
    let server = ServerScope::open(&paths)?;
    let reporter = Reporter::from_config(config, server, Arc::new(host), Arc::new(EnvProxyProbe))?;
    Ok(reporter)
}
