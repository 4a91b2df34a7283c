//! Line-oriented `key=value` property stores with comment support.
//!
//! Both scoped configuration records are backed by a [`PropertyStore`]. The
//! on-disk flavour is [`PropertiesFile`]; [`MemoryStore`] keeps everything in
//! memory for tests and for hosts that persist settings elsewhere.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;

/// A reloadable, persistent key-value store.
pub trait PropertyStore: Send + Sync {
    /// Re-read the store from its backing storage, discarding in-memory state.
    fn reload(&self) -> Result<()>;

    /// Current value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Insert or replace `key`. Not persisted until [`PropertyStore::save`].
    fn set(&self, key: &str, value: &str);

    /// Replace the comment lines written above `key`.
    fn set_comments(&self, key: &str, lines: &[&str]);

    /// Replace the header comment block at the top of the store.
    fn set_header(&self, lines: &[&str]);

    /// Persist the store to its backing storage.
    fn save(&self) -> Result<()>;

    /// Read a boolean flag, inserting `default` when the key is absent.
    fn get_bool_or_insert(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(value) => parse_bool(&value).unwrap_or(default),
            None => {
                self.set(key, if default { "true" } else { "false" });
                default
            }
        }
    }

    /// Read a string value, inserting `default` when the key is absent.
    fn get_string_or_insert(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(value) => value,
            None => {
                self.set(key, default);
                default.to_string()
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.trim().eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.trim().eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
    comments: Vec<String>,
}

/// Parsed contents shared by both store flavours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Properties {
    header: Vec<String>,
    entries: Vec<Entry>,
}

impl Properties {
    fn parse(text: &str) -> Self {
        let mut props = Properties::default();
        let mut pending: Vec<String> = Vec::new();
        let mut seen_entry = false;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                // A comment block closed by a blank line before any key is the header.
                if !seen_entry && props.header.is_empty() && !pending.is_empty() {
                    props.header = std::mem::take(&mut pending);
                }
                continue;
            }
            if let Some(comment) = line.strip_prefix('#').or_else(|| line.strip_prefix('!')) {
                pending.push(comment.strip_prefix(' ').unwrap_or(comment).to_string());
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            seen_entry = true;
            let key = key.trim();
            let comments = std::mem::take(&mut pending);
            match props.entries.iter_mut().find(|e| e.key == key) {
                Some(existing) => existing.value = value.trim().to_string(),
                None => props.entries.push(Entry {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                    comments,
                }),
            }
        }

        props
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
        if !self.header.is_empty() {
            out.push('\n');
        }
        for entry in &self.entries {
            for comment in &entry.comments {
                out.push_str("# ");
                out.push_str(comment);
                out.push('\n');
            }
            out.push_str(&entry.key);
            out.push('=');
            out.push_str(&entry.value);
            out.push('\n');
        }
        out
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.clone())
    }

    fn entry_mut(&mut self, key: &str) -> &mut Entry {
        let index = match self.entries.iter().position(|e| e.key == key) {
            Some(index) => index,
            None => {
                self.entries.push(Entry {
                    key: key.to_string(),
                    ..Entry::default()
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }
}

fn lock(props: &Mutex<Properties>) -> MutexGuard<'_, Properties> {
    props.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_lines(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

/// A property store persisted as a text file.
#[derive(Debug)]
pub struct PropertiesFile {
    path: PathBuf,
    props: Mutex<Properties>,
}

impl PropertiesFile {
    /// Open the file at `path`. A missing file yields an empty store; it is
    /// created on the first [`PropertyStore::save`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            props: Mutex::new(Properties::default()),
        };
        store.reload()?;
        Ok(store)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PropertyStore for PropertiesFile {
    fn reload(&self) -> Result<()> {
        let parsed = match std::fs::read_to_string(&self.path) {
            Ok(text) => Properties::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Properties::default(),
            Err(e) => return Err(e.into()),
        };
        *lock(&self.props) = parsed;
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        lock(&self.props).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.props).entry_mut(key).value = value.to_string();
    }

    fn set_comments(&self, key: &str, lines: &[&str]) {
        lock(&self.props).entry_mut(key).comments = to_lines(lines);
    }

    fn set_header(&self, lines: &[&str]) {
        lock(&self.props).header = to_lines(lines);
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = lock(&self.props).render();
        std::fs::write(&self.path, text)?;
        tracing::debug!(path = %self.path.display(), "saved properties file");
        Ok(())
    }
}

/// An in-memory property store. `reload` and `save` are no-ops.
#[derive(Debug, Default)]
pub struct MemoryStore {
    props: Mutex<Properties>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the store in the on-disk text format.
    pub fn render(&self) -> String {
        lock(&self.props).render()
    }
}

impl PropertyStore for MemoryStore {
    fn reload(&self) -> Result<()> {
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        lock(&self.props).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.props).entry_mut(key).value = value.to_string();
    }

    fn set_comments(&self, key: &str, lines: &[&str]) {
        lock(&self.props).entry_mut(key).comments = to_lines(lines);
    }

    fn set_header(&self, lines: &[&str]) {
        lock(&self.props).header = to_lines(lines);
    }

    fn save(&self) -> Result<()> {
        Ok(())
    }
}
