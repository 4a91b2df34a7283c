use std::path::Path;

use metrics_lite_core::config::LiteConfig;
use metrics_lite_core::gate::{MetricsPaths, ReporterScope, ServerScope};
use tracing::info;

/// Run the `init` command: write a default config and create both Metrics stores.
pub fn run(
    config_path: &str,
    plugin_name: &str,
    plugin_version: &str,
    config_dir: &str,
) -> anyhow::Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        anyhow::bail!("{config_path} already exists; refusing to overwrite");
    }

    let config = LiteConfig::generate_default(plugin_name, plugin_version, config_dir);
    config.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, config.to_toml()?)?;
    info!("Wrote configuration to {}", path.display());

    let paths = MetricsPaths::new(config_dir);
    let server = ServerScope::open(&paths)?;
    ReporterScope::open(&paths, plugin_name)?;
    info!("Initialized Metrics stores under {}", paths.root().display());

    println!("metrics-lite initialized successfully!");
    println!("  Configuration: {}", path.display());
    println!("  Server store:  {}", paths.server_store().display());
    println!("  Plugin store:  {}", paths.reporter_store(plugin_name).display());
    println!("  GUID:          {}", server.guid()?);

    Ok(())
}
