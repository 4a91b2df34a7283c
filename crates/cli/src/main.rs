use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "metrics-lite", about = "Opt-out usage reporter for server plugins", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "metrics-lite.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Write a default configuration and create the Metrics stores
    Init {
        /// Name of the reporting plugin
        #[arg(long)]
        plugin_name: String,
        /// Version of the reporting plugin
        #[arg(long, default_value = "0.1.0")]
        plugin_version: String,
        /// Directory holding the Metrics.cfg stores
        #[arg(long, default_value = "config")]
        config_dir: String,
    },
    /// Show the installation GUID and effective flags
    Status,
    /// Stop reporting for this plugin
    OptOut,
    /// Resume reporting for this plugin
    OptIn,
    /// Send a single report
    Post {
        /// Send a ping instead of a first-contact report
        #[arg(long)]
        ping: bool,
        #[command(flatten)]
        host: HostArgs,
    },
    /// Report until interrupted
    Run {
        #[command(flatten)]
        host: HostArgs,
    },
}

/// Facts normally supplied by the host server.
#[derive(clap::Args, Debug, Clone)]
pub struct HostArgs {
    /// Full server version string
    #[arg(long)]
    server_version: String,
    /// Players currently online
    #[arg(long, default_value = "0")]
    players: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            plugin_name,
            plugin_version,
            config_dir,
        } => {
            commands::init::run(&cli.config, &plugin_name, &plugin_version, &config_dir)?;
        }
        Commands::Status => {
            commands::status::run(&cli.config)?;
        }
        Commands::OptOut => {
            commands::opt::run(&cli.config, true)?;
        }
        Commands::OptIn => {
            commands::opt::run(&cli.config, false)?;
        }
        Commands::Post { ping, host } => {
            commands::post::run(&cli.config, ping, host.into()).await?;
        }
        Commands::Run { host } => {
            commands::run::run(&cli.config, host.into()).await?;
        }
    }

    Ok(())
}

impl From<HostArgs> for metrics_lite_telemetry::StaticHost {
    fn from(args: HostArgs) -> Self {
        Self {
            server_version: args.server_version,
            players_online: args.players,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_parse_init_defaults() {
        let cli = Cli::parse_from(["metrics-lite", "init", "--plugin-name", "Demo"]);
        assert_eq!(cli.config, "metrics-lite.toml");
        match cli.command {
            Commands::Init {
                plugin_name,
                plugin_version,
                config_dir,
            } => {
                assert_eq!(plugin_name, "Demo");
                assert_eq!(plugin_version, "0.1.0");
                assert_eq!(config_dir, "config");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_parse_init_custom() {
        let cli = Cli::parse_from([
            "metrics-lite",
            "--config",
            "/etc/metrics-lite.toml",
            "init",
            "--plugin-name",
            "WorldGuard",
            "--plugin-version",
            "6.2.1",
            "--config-dir",
            "/srv/config",
        ]);
        assert_eq!(cli.config, "/etc/metrics-lite.toml");
        match cli.command {
            Commands::Init {
                plugin_name,
                plugin_version,
                config_dir,
            } => {
                assert_eq!(plugin_name, "WorldGuard");
                assert_eq!(plugin_version, "6.2.1");
                assert_eq!(config_dir, "/srv/config");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_parse_init_requires_plugin_name() {
        assert!(Cli::try_parse_from(["metrics-lite", "init"]).is_err());
    }

    #[test]
    fn cli_parse_status() {
        let cli = Cli::parse_from(["metrics-lite", "status"]);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn cli_parse_opt_out_and_in() {
        let cli = Cli::parse_from(["metrics-lite", "opt-out"]);
        assert!(matches!(cli.command, Commands::OptOut));
        let cli = Cli::parse_from(["metrics-lite", "opt-in"]);
        assert!(matches!(cli.command, Commands::OptIn));
    }

    #[test]
    fn cli_parse_post_defaults() {
        let cli = Cli::parse_from(["metrics-lite", "post", "--server-version", "1.2.0"]);
        match cli.command {
            Commands::Post { ping, host } => {
                assert!(!ping);
                assert_eq!(host.server_version, "1.2.0");
                assert_eq!(host.players, 0);
            }
            _ => panic!("expected Post command"),
        }
    }

    #[test]
    fn cli_parse_post_ping() {
        let cli = Cli::parse_from([
            "metrics-lite",
            "post",
            "--ping",
            "--server-version",
            "1.2.0 (MC: 1.7.10)",
            "--players",
            "12",
        ]);
        match cli.command {
            Commands::Post { ping, host } => {
                assert!(ping);
                assert_eq!(host.server_version, "1.2.0 (MC: 1.7.10)");
                assert_eq!(host.players, 12);
            }
            _ => panic!("expected Post command"),
        }
    }

    #[test]
    fn cli_parse_run() {
        let cli = Cli::parse_from(["metrics-lite", "run", "--server-version", "1.2.0"]);
        match cli.command {
            Commands::Run { host } => {
                let host: metrics_lite_telemetry::StaticHost = host.into();
                assert_eq!(host.server_version, "1.2.0");
                assert_eq!(host.players_online, 0);
            }
            _ => panic!("expected Run command"),
        }
    }
}
