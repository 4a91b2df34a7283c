use metrics_lite_core::gate::{ConfigGate, MetricsPaths, ReporterScope, ServerScope};
use tracing::info;

use super::load_config;

/// Run the `opt-out` / `opt-in` commands: persist the plugin's opt-out flag.
pub fn run(config_path: &str, opt_out: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let plugin_name = &config.reporter.plugin_name;

    let paths = MetricsPaths::new(&config.reporter.config_dir);
    let gate = ConfigGate::new(
        ServerScope::open(&paths)?,
        ReporterScope::open(&paths, plugin_name)?,
    );

    if opt_out {
        gate.opt_out()?;
        info!("Opted out of metrics for {}", plugin_name);
        println!("Metrics reporting disabled for {plugin_name}.");
    } else {
        gate.opt_in()?;
        info!("Opted in to metrics for {}", plugin_name);
        if gate.is_opted_out()? {
            println!("{plugin_name} opted in, but the server-wide opt-out is still set.");
        } else {
            println!("Metrics reporting enabled for {plugin_name}.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_lite_core::config::LiteConfig;

    #[test]
    fn opt_out_then_in_round_trips_flag() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("metrics-lite.toml");
        let config_dir = dir.path().join("config");
        let config =
            LiteConfig::generate_default("Demo", "1.0.0", config_dir.to_str().unwrap());
        std::fs::write(&config_path, config.to_toml().unwrap()).unwrap();

        run(config_path.to_str().unwrap(), true).unwrap();
        let store = MetricsPaths::new(&config_dir).reporter_store("Demo");
        assert!(std::fs::read_to_string(&store).unwrap().contains("opt-out=true"));

        run(config_path.to_str().unwrap(), false).unwrap();
        assert!(std::fs::read_to_string(&store).unwrap().contains("opt-out=false"));
    }
}
