//! # Resource Store
//!
//! Thread-safe, cloneable table of mock records, optionally mirrored to a
//! JSON file.
//!
//! ## Persistence
//!
//! - On open, a missing or unparsable file yields an empty table. This is
//!   logged, never fatal.
//! - After every successful mutation the full table is written to a sibling
//!   temp file and renamed over the target, while the lock is still held.
//! - A failed write is logged at `error` level. The in-memory mutation is
//!   kept.
//!
//! File format: `{ "<resource>": [ {record}, ... ], ... }`, pretty-printed.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;

/// One stored record: an open JSON object with an integer `id`.
pub type Record = Map<String, Value>;

type Tables = BTreeMap<String, Vec<Record>>;

/// Errors from writing the backing file.
///
/// These never reach a caller of the CRUD operations; they are logged and
/// the in-memory state stands.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Writing or renaming the file failed.
    #[error("failed to write resource store {}: {source}", path.display())]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The table could not be serialized.
    #[error("failed to serialize resource store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// How `create` picks the new record's `id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdPolicy {
    /// Current record count plus one. After deleting from the middle of a
    /// list the next id can equal a live record's id.
    #[default]
    Count,
    /// Largest existing id plus one. Never collides with a live record.
    NextAfterMax,
}

impl IdPolicy {
    /// Kebab-case name, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::NextAfterMax => "next-after-max",
        }
    }
}

impl fmt::Display for IdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The process-wide resource table.
///
/// Cloning is cheap and every clone shares the same table.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    tables: Arc<Mutex<Tables>>,
    path: Option<Arc<PathBuf>>,
    id_policy: IdPolicy,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ResourceStore {
    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::new())),
            path: None,
            id_policy: IdPolicy::default(),
        }
    }

    /// Open the store mirrored at `path`, loading whatever it holds.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tables = load(&path);
        tracing::info!(
            path = %path.display(),
            resources = tables.len(),
            "resource store opened"
        );
        Self {
            tables: Arc::new(Mutex::new(tables)),
            path: Some(Arc::new(path)),
            id_policy: IdPolicy::default(),
        }
    }

    /// Use `policy` for ids assigned from now on.
    #[must_use]
    pub fn with_id_policy(mut self, policy: IdPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    /// The id policy in effect.
    pub fn id_policy(&self) -> IdPolicy {
        self.id_policy
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    /// Make sure `resource` has a (possibly empty) list. Not persisted.
    pub fn register(&self, resource: &str) {
        self.tables
            .lock()
            .entry(resource.to_string())
            .or_default();
    }

    /// Names of every known resource, sorted.
    pub fn resources(&self) -> Vec<String> {
        self.tables.lock().keys().cloned().collect()
    }

    /// Whether the table lock can be taken within `wait`.
    ///
    /// Blocks the calling thread for up to `wait`.
    pub fn is_available(&self, wait: Duration) -> bool {
        self.tables.try_lock_for(wait).is_some()
    }

    /// All records of `resource` in insertion order. Empty if unseen.
    pub fn get(&self, resource: &str) -> Vec<Record> {
        self.tables
            .lock()
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    /// The first record of `resource` whose `id` equals `id`.
    pub fn get_by_id(&self, resource: &str, id: i64) -> Option<Record> {
        self.tables
            .lock()
            .get(resource)?
            .iter()
            .find(|r| record_id(r) == Some(id))
            .cloned()
    }

    /// Append a record built from `fields`, assigning its `id`.
    ///
    /// Any `id` in `fields` is overwritten.
    pub fn create(&self, resource: &str, fields: Record) -> Record {
        let mut tables = self.tables.lock();
        let list = tables.entry(resource.to_string()).or_default();

        let id = match self.id_policy {
            IdPolicy::Count => list.len() as i64 + 1,
            IdPolicy::NextAfterMax => list.iter().filter_map(record_id).max().unwrap_or(0) + 1,
        };

        let mut record = fields;
        record.insert("id".to_string(), Value::from(id));
        list.push(record.clone());

        tracing::debug!(resource, id, "record created");
        self.persist(&tables);
        record
    }

    /// Merge `patch` into the record with `id`: keys in `patch` overwrite,
    /// new keys are added. An `id` key in `patch` is ignored.
    pub fn update(&self, resource: &str, id: i64, patch: Record) -> Option<Record> {
        let mut tables = self.tables.lock();
        let record = tables
            .get_mut(resource)?
            .iter_mut()
            .find(|r| record_id(r) == Some(id))?;

        for (key, value) in patch {
            if key != "id" {
                record.insert(key, value);
            }
        }
        let updated = record.clone();

        tracing::debug!(resource, id, "record updated");
        self.persist(&tables);
        Some(updated)
    }

    /// Remove the record with `id`. Returns whether one was removed.
    pub fn delete(&self, resource: &str, id: i64) -> bool {
        let mut tables = self.tables.lock();
        let Some(list) = tables.get_mut(resource) else {
            return false;
        };
        let Some(index) = list.iter().position(|r| record_id(r) == Some(id)) else {
            return false;
        };
        list.remove(index);

        tracing::debug!(resource, id, "record deleted");
        self.persist(&tables);
        true
    }

    fn persist(&self, tables: &Tables) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = save(path, tables) {
            tracing::error!(error = %e, "resource store write failed; keeping in-memory state");
        }
    }
}

/// Integer id of a record. Integral floats count, since hand-edited files
/// may write `1.0`.
fn record_id(record: &Record) -> Option<i64> {
    let id = record.get("id")?;
    id.as_i64().or_else(|| {
        id.as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn load(path: &Path) -> Tables {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no resource store file yet; starting empty");
            return Tables::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "resource store unreadable; starting empty");
            return Tables::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "resource store corrupt; starting empty");
            Tables::new()
        }
    }
}

fn save(path: &Path, tables: &Tables) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(tables)?;

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    std::fs::write(&tmp, bytes).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
