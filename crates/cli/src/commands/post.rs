use metrics_lite_telemetry::StaticHost;
use tracing::info;

use super::{load_config, open_reporter};

/// Run the `post` command: send one report unless opted out.
pub async fn run(config_path: &str, ping: bool, host: StaticHost) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let reporter = open_reporter(&config, host)?;

    if reporter.gate().is_opted_out()? {
        println!("Metrics reporting is opted out; nothing sent.");
        return Ok(());
    }

    info!(ping, "Sending report for {}", reporter.plugin_name());
    reporter.post_once(ping).await?;
    println!("Report accepted by {}", config.reporter.base_url);

    Ok(())
}
