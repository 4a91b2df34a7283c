//! metrics-lite telemetry: opt-out usage reporting for server plugins.
//!
//! A [`Scheduler`] sends a first-contact report when started and a ping every
//! fifteen minutes afterwards. Each report carries the installation GUID, the
//! plugin version, the server version, the online player count and basic
//! operating system facts. Reporting stops as soon as the server-wide or the
//! per-plugin configuration opts out.

pub mod collector;
pub mod compress;
pub mod json;
pub mod models;
pub mod scheduler;
pub mod transport;

pub use collector::{HostFacts, Reporter, StaticHost};
pub use models::{EnvironmentSnapshot, ReportPayload, ReporterIdentity};
pub use scheduler::{Scheduler, SchedulerState};
pub use transport::{EnvProxyProbe, NoProxyInjector, ProxyProbe, TransportClient};
