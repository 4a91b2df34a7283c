//! Two-tier opt-out and debug gate.
//!
//! Reporting is governed by a server-wide scope shared by every reporter in
//! the process and by a per-reporter scope. Each flag is effective when either
//! scope sets it. Both stores are reloaded on every check so that operator
//! edits take effect without a restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::properties::{PropertiesFile, PropertyStore};

pub const KEY_GUID: &str = "guid";
pub const KEY_OPT_OUT: &str = "opt-out";
pub const KEY_DEBUG: &str = "debug";

/// Conventional on-disk locations of the scoped stores under a config root.
#[derive(Debug, Clone)]
pub struct MetricsPaths {
    root: PathBuf,
}

impl MetricsPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/Metrics/Metrics.cfg`
    pub fn server_store(&self) -> PathBuf {
        self.root.join("Metrics").join("Metrics.cfg")
    }

    /// `<root>/<plugin_name>/Metrics.cfg`
    pub fn reporter_store(&self, plugin_name: &str) -> PathBuf {
        self.root.join(plugin_name).join("Metrics.cfg")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Server-wide settings: installation GUID plus the global flags.
///
/// Created once by the host and handed to every reporter as an `Arc`.
pub struct ServerScope {
    store: Box<dyn PropertyStore>,
}

impl ServerScope {
    /// Write any missing defaults, comments and the header, then save.
    pub fn initialize(store: Box<dyn PropertyStore>) -> Result<Self> {
        store.reload()?;
        store.get_string_or_insert(KEY_GUID, &Uuid::new_v4().to_string());
        store.get_bool_or_insert(KEY_OPT_OUT, false);
        store.set_comments(
            KEY_OPT_OUT,
            &["Set true to stop all Metrics reporting for this server"],
        );
        store.get_bool_or_insert(KEY_DEBUG, false);
        store.set_comments(
            KEY_DEBUG,
            &["Set true to enable debugging for all reporting on this server"],
        );
        store.set_header(&["Metrics Server Config", "Affects all Metrics reporters"]);
        store.save()?;
        Ok(Self { store })
    }

    /// Open the file-backed server scope under `paths`.
    pub fn open(paths: &MetricsPaths) -> Result<Arc<Self>> {
        let store = PropertiesFile::open(paths.server_store())?;
        Ok(Arc::new(Self::initialize(Box::new(store))?))
    }

    /// The installation GUID. Regenerated and persisted if the key was removed.
    pub fn guid(&self) -> Result<String> {
        self.store.reload()?;
        if let Some(guid) = self.store.get(KEY_GUID) {
            return Ok(guid);
        }
        let guid = self
            .store
            .get_string_or_insert(KEY_GUID, &Uuid::new_v4().to_string());
        self.store.save()?;
        tracing::info!(%guid, "generated new installation guid");
        Ok(guid)
    }

    fn flag(&self, key: &str) -> Result<bool> {
        self.store.reload()?;
        Ok(self.store.get_bool_or_insert(key, false))
    }
}

/// Settings owned by one reporter.
pub struct ReporterScope {
    store: Box<dyn PropertyStore>,
}

impl ReporterScope {
    /// Write any missing defaults, comments and the header, then save.
    pub fn initialize(store: Box<dyn PropertyStore>, plugin_name: &str) -> Result<Self> {
        store.reload()?;
        store.get_bool_or_insert(KEY_OPT_OUT, false);
        let opt_out_comment = format!("Set true to stop Metrics from reporting for {plugin_name}");
        store.set_comments(KEY_OPT_OUT, &[opt_out_comment.as_str()]);
        store.get_bool_or_insert(KEY_DEBUG, false);
        let debug_comment = format!("Set true to enable debugging for reporting on {plugin_name}");
        store.set_comments(KEY_DEBUG, &[debug_comment.as_str()]);
        let scope_line = format!("Affects Metrics reporting for {plugin_name} only");
        store.set_header(&["Metrics Plugin Config", scope_line.as_str()]);
        store.save()?;
        Ok(Self { store })
    }

    /// Open the file-backed reporter scope for `plugin_name` under `paths`.
    pub fn open(paths: &MetricsPaths, plugin_name: &str) -> Result<Self> {
        let store = PropertiesFile::open(paths.reporter_store(plugin_name))?;
        Self::initialize(Box::new(store), plugin_name)
    }

    fn flag(&self, key: &str) -> Result<bool> {
        self.store.reload()?;
        Ok(self.store.get_bool_or_insert(key, false))
    }

    fn persist_flag(&self, key: &str, value: bool) -> Result<()> {
        self.store.reload()?;
        self.store.set(key, if value { "true" } else { "false" });
        self.store.save()
    }
}

/// Combines both scopes with OR semantics.
pub struct ConfigGate {
    server: Arc<ServerScope>,
    reporter: ReporterScope,
}

impl ConfigGate {
    pub fn new(server: Arc<ServerScope>, reporter: ReporterScope) -> Self {
        Self { server, reporter }
    }

    /// Whether reporting is suppressed by either scope.
    pub fn is_opted_out(&self) -> Result<bool> {
        if self.server.flag(KEY_OPT_OUT)? {
            return Ok(true);
        }
        self.reporter.flag(KEY_OPT_OUT)
    }

    /// Whether diagnostic output is requested by either scope.
    pub fn is_debug(&self) -> Result<bool> {
        if self.server.flag(KEY_DEBUG)? {
            return Ok(true);
        }
        self.reporter.flag(KEY_DEBUG)
    }

    /// Persist `opt-out=true` in the reporter scope.
    pub fn opt_out(&self) -> Result<()> {
        self.reporter.persist_flag(KEY_OPT_OUT, true)
    }

    /// Persist `opt-out=false` in the reporter scope. The server scope is
    /// left untouched, so a server-wide opt-out still wins.
    pub fn opt_in(&self) -> Result<()> {
        self.reporter.persist_flag(KEY_OPT_OUT, false)
    }

    pub fn server(&self) -> &Arc<ServerScope> {
        &self.server
    }
}
