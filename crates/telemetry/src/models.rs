//! Report data models: reporter identity, environment facts and the
//! ordered payload sent to the collection endpoint.

use crate::collector::HostFacts;

/// Who is reporting. The GUID identifies the installation, not the plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterIdentity {
    pub plugin_name: String,
    pub plugin_version: String,
    pub guid: String,
}

/// Environment facts gathered fresh for every report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    pub server_version: String,
    pub players_online: i64,
    pub os_name: String,
    /// Normalized with [`normalize_arch`].
    pub os_arch: String,
    pub os_version: String,
    pub runtime_version: String,
    pub core_count: usize,
}

impl EnvironmentSnapshot {
    /// Collect host-supplied facts plus operating system details.
    pub fn capture(host: &dyn HostFacts) -> Self {
        let os_version = sysinfo::System::kernel_version()
            .or_else(sysinfo::System::os_version)
            .unwrap_or_else(|| "unknown".to_string());
        let core_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            server_version: host.full_server_version(),
            players_online: host.players_online(),
            os_name: os_family_name(std::env::consts::OS),
            os_arch: normalize_arch(std::env::consts::ARCH),
            os_version,
            runtime_version: host.runtime_version(),
            core_count,
        }
    }
}

/// Operating system family name as collectors group it, e.g. `Linux`.
/// The distribution name is never reported.
pub fn os_family_name(os: &str) -> String {
    match os {
        "linux" => "Linux",
        "macos" => "Mac OS X",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        "openbsd" => "OpenBSD",
        "netbsd" => "NetBSD",
        "dragonfly" => "DragonFlyBSD",
        "solaris" | "illumos" => "SunOS",
        "android" => "Linux",
        other => other,
    }
    .to_string()
}

/// Map architecture aliases onto the names the collector groups by.
pub fn normalize_arch(arch: &str) -> String {
    match arch {
        "amd64" => "x86_64".to_string(),
        other => other.to_string(),
    }
}

/// Ordered key/value pairs making up one report. Values are kept as strings;
/// the encoder decides which of them are emitted as JSON numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPayload {
    pairs: Vec<(String, String)>,
}

impl ReportPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the wire payload in collector field order.
    pub fn build(
        identity: &ReporterIdentity,
        snapshot: &EnvironmentSnapshot,
        is_ping: bool,
    ) -> Self {
        let mut payload = Self::new();
        payload.push("guid", &identity.guid);
        payload.push("plugin_version", &identity.plugin_version);
        payload.push("server_version", &snapshot.server_version);
        payload.push("players_online", &snapshot.players_online.to_string());
        payload.push("osname", &snapshot.os_name);
        payload.push("osarch", &normalize_arch(&snapshot.os_arch));
        payload.push("osversion", &snapshot.os_version);
        payload.push("cores", &snapshot.core_count.to_string());
        payload.push("java_version", &snapshot.runtime_version);
        if is_ping {
            payload.push("ping", "1");
        }
        payload
    }

    /// Append a pair; insertion order is preserved on the wire.
    pub fn push(&mut self, key: &str, value: &str) {
        self.pairs.push((key.to_string(), value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
