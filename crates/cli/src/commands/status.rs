use metrics_lite_core::gate::{ConfigGate, MetricsPaths, ReporterScope, ServerScope};

use super::load_config;

/// Run the `status` command: show the GUID and the effective flags.
pub fn run(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let section = &config.reporter;

    let paths = MetricsPaths::new(&section.config_dir);
    let server = ServerScope::open(&paths)?;
    let gate = ConfigGate::new(server, ReporterScope::open(&paths, &section.plugin_name)?);

    println!("metrics-lite Status");
    println!("===================");
    println!("Plugin:   {} {}", section.plugin_name, section.plugin_version);
    println!("GUID:     {}", gate.server().guid()?);
    println!("Endpoint: {}", section.base_url);
    println!("Interval: {} minutes", section.ping_interval_minutes);
    println!("Opt-out:  {}", gate.is_opted_out()?);
    println!("Debug:    {}", gate.is_debug()?);
    println!();
    println!("Server store: {}", paths.server_store().display());
    println!("Plugin store: {}", paths.reporter_store(&section.plugin_name).display());

    Ok(())
}
