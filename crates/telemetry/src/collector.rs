//! Report assembly: gathers identity and environment facts and hands the
//! encoded payload to the transport.

use std::sync::Arc;
use std::time::Duration;

use metrics_lite_core::config::LiteConfig;
use metrics_lite_core::error::Result;
use metrics_lite_core::gate::{ConfigGate, MetricsPaths, ReporterScope, ServerScope};

use crate::compress::gzip;
use crate::json;
use crate::models::{EnvironmentSnapshot, ReportPayload, ReporterIdentity};
use crate::transport::{ProxyProbe, TransportClient};

/// Version of the `rustc` that compiled this crate, e.g. `1.82.0`.
pub const RUSTC_VERSION: &str = env!("METRICS_LITE_RUSTC_VERSION");

/// Facts only the host application can supply.
pub trait HostFacts: Send + Sync {
    /// Full server software version, e.g. `"1.2.0 (MC: 1.7.10)"`.
    fn full_server_version(&self) -> String;

    /// Number of players currently online.
    fn players_online(&self) -> i64;

    /// Runtime version reported under `java_version`. Defaults to the
    /// compiler that built this crate.
    fn runtime_version(&self) -> String {
        RUSTC_VERSION.to_string()
    }
}

/// Host facts fixed at construction time.
#[derive(Debug, Clone)]
pub struct StaticHost {
    pub server_version: String,
    pub players_online: i64,
}

impl HostFacts for StaticHost {
    fn full_server_version(&self) -> String {
        self.server_version.clone()
    }

    fn players_online(&self) -> i64 {
        self.players_online
    }
}

/// Builds and delivers reports for one plugin.
pub struct Reporter {
    plugin_name: String,
    plugin_version: String,
    gate: ConfigGate,
    transport: TransportClient,
    host: Arc<dyn HostFacts>,
}

impl Reporter {
    pub fn new(
        plugin_name: &str,
        plugin_version: &str,
        gate: ConfigGate,
        transport: TransportClient,
        host: Arc<dyn HostFacts>,
    ) -> Self {
        Self {
            plugin_name: plugin_name.to_string(),
            plugin_version: plugin_version.to_string(),
            gate,
            transport,
            host,
        }
    }

    /// Build a reporter from host settings, opening the reporter scope under
    /// the configured directory.
    pub fn from_config(
        config: &LiteConfig,
        server: Arc<ServerScope>,
        host: Arc<dyn HostFacts>,
        proxy_probe: Arc<dyn ProxyProbe>,
    ) -> Result<Self> {
        let section = &config.reporter;
        let paths = MetricsPaths::new(&section.config_dir);
        let scope = ReporterScope::open(&paths, &section.plugin_name)?;

        let probe = if section.bypass_proxy {
            Arc::new(|| true) as Arc<dyn ProxyProbe>
        } else {
            proxy_probe
        };
        let transport = TransportClient::new()
            .with_base_url(&section.base_url)
            .with_timeout(Duration::from_secs(section.request_timeout_secs))
            .with_proxy_probe(probe);

        Ok(Self::new(
            &section.plugin_name,
            &section.plugin_version,
            ConfigGate::new(server, scope),
            transport,
            host,
        ))
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn gate(&self) -> &ConfigGate {
        &self.gate
    }

    /// Effective debug flag; an unreadable store counts as "off".
    pub fn debug_enabled(&self) -> bool {
        self.gate.is_debug().unwrap_or(false)
    }

    /// Current identity. The GUID is re-read from the server scope each time.
    pub fn identity(&self) -> Result<ReporterIdentity> {
        Ok(ReporterIdentity {
            plugin_name: self.plugin_name.clone(),
            plugin_version: self.plugin_version.clone(),
            guid: self.gate.server().guid()?,
        })
    }

    pub fn build_payload(&self, is_ping: bool) -> Result<ReportPayload> {
        let identity = self.identity()?;
        let snapshot = EnvironmentSnapshot::capture(self.host.as_ref());
        Ok(ReportPayload::build(&identity, &snapshot, is_ping))
    }

    /// Build, encode, compress and send one report.
    pub async fn post_once(&self, is_ping: bool) -> Result<()> {
        let payload = self.build_payload(is_ping)?;
        let body = json::encode(&payload);
        let compressed = gzip(body.as_bytes())?;

        if self.debug_enabled() {
            tracing::info!(
                plugin = %self.plugin_name,
                uncompressed = body.len(),
                compressed = compressed.len(),
                "prepared report request"
            );
        }

        let line = self.transport.send(&self.plugin_name, compressed).await?;
        tracing::debug!(
            plugin = %self.plugin_name,
            ping = is_ping,
            response = %line,
            "report accepted"
        );
        Ok(())
    }
}
