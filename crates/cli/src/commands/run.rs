use std::sync::Arc;
use std::time::Duration;

use metrics_lite_telemetry::{Scheduler, StaticHost};
use tracing::info;

use super::{load_config, open_reporter};

/// Run the `run` command: report on schedule until Ctrl-C.
pub async fn run(config_path: &str, host: StaticHost) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let reporter = Arc::new(open_reporter(&config, host)?);
    let interval = Duration::from_secs(config.reporter.ping_interval_minutes.saturating_mul(60));
    let scheduler = Scheduler::new(reporter).with_ping_interval(interval);

    if !scheduler.start()? {
        println!("Metrics reporting is opted out; not starting.");
        return Ok(());
    }

    println!(
        "Reporting for {} every {} minutes (Ctrl-C to stop)",
        config.reporter.plugin_name, config.reporter.ping_interval_minutes
    );

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");
    scheduler.disable();

    Ok(())
}
