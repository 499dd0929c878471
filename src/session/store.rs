//! File-backed session cache.
//!
//! Each session is one JSON file, `<dir>/<session>.json`. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! record, so readers never see a partial file. Two processes writing the
//! same session do not merge: the last rename wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cache::SessionScopedCache;
use crate::error::{HealthError, Result};

/// Persisted content of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SessionRecord {
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    data: BTreeMap<String, BTreeMap<String, Value>>,
}

/// Session cache persisted under a state directory.
#[derive(Debug)]
pub struct FileSessionCache {
    path: PathBuf,
    record: SessionRecord,
}

impl FileSessionCache {
    /// Open (or start) the cache of `session` under `dir`.
    ///
    /// A missing or unreadable record starts an empty session.
    pub fn open(dir: impl AsRef<Path>, session: &str) -> Result<Self> {
        if !is_valid_session_id(session) {
            return Err(HealthError::InvalidSessionId {
                id: session.to_string(),
            });
        }

        let path = dir.as_ref().join(format!("{}.json", session));
        let record = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt session cache {:?}: {}", path, e);
                SessionRecord::default()
            }),
            Err(_) => SessionRecord::default(),
        };

        Ok(Self { path, record })
    }

    /// Path of the session record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the record was last written.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.record.updated_at
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.record).map_err(anyhow::Error::from)?;
        let temp = self
            .path
            .with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl SessionScopedCache for FileSessionCache {
    fn get(&self, namespace: &str, field: &str) -> Option<Value> {
        self.record.data.get(namespace)?.get(field).cloned()
    }

    fn set(&mut self, namespace: &str, field: &str, value: Value) {
        self.record
            .data
            .entry(namespace.to_string())
            .or_default()
            .insert(field.to_string(), value);
        self.record.updated_at = Some(Utc::now());

        if let Err(e) = self.persist() {
            tracing::warn!("Failed to write session cache {:?}: {}", self.path, e);
        }
    }
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
