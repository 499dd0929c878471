//! Hosted metadata lookup.
//!
//! The prerequisite matrix needs the identity provider's own (hosted)
//! metadata to find its signing keys. Lookup goes through the
//! [`MetadataProvider`] trait so callers can substitute any store.
//!
//! [`FileMetadataProvider`] reads `<metadatadir>/<set>.yml` (or `.yaml`,
//! `.json`), a mapping of entity ID to entry:
//!
//! ```yaml
//! https://idp.example.org/saml2/idp/metadata.php:
//!   host: __DEFAULT__
//!   privatekey: idp.pem
//!   certificate: idp.crt
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::DeploymentConfig;
use crate::error::{HealthError, Result};

/// Host value marking the entry used when no other entry matches.
pub const DEFAULT_HOST: &str = "__DEFAULT__";

/// Metadata sets with hosted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataSet {
    /// Hosted SAML 2.0 identity provider.
    Saml20IdpHosted,
}

impl MetadataSet {
    /// Name of the set, also used as the file stem.
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataSet::Saml20IdpHosted => "saml20-idp-hosted",
        }
    }
}

impl fmt::Display for MetadataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of hosted metadata.
pub trait MetadataProvider {
    /// The current hosted entry of a set.
    ///
    /// # Errors
    ///
    /// Returns `MetadataNotFound` when the set has no usable hosted entry.
    fn hosted_metadata(&self, set: MetadataSet) -> Result<DeploymentConfig>;
}

/// Reads metadata sets from files in a directory.
#[derive(Debug, Clone)]
pub struct FileMetadataProvider {
    dir: PathBuf,
    host: Option<String>,
}

impl FileMetadataProvider {
    /// Read sets from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            host: None,
        }
    }

    /// Read sets from the configured `metadatadir` (default `metadata/`).
    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self::new(config.resolve_path(&config.string("metadatadir", "metadata/")))
    }

    /// Prefer entries whose `host` matches this host name.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Directory the sets are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn set_file(&self, set: MetadataSet) -> Option<PathBuf> {
        ["yml", "yaml", "json"]
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", set.as_str(), ext)))
            .find(|p| p.is_file())
    }

    fn load_set(&self, set: MetadataSet) -> Result<Map<String, Value>> {
        let path = self.set_file(set).ok_or_else(|| {
            not_found(
                set,
                format!("no {}.yml, .yaml or .json in {}", set, self.dir.display()),
            )
        })?;

        let content = fs::read_to_string(&path)?;
        let value: Value = serde_yaml::from_str(&content)
            .map_err(|e| not_found(set, format!("{}: {}", path.display(), e)))?;

        match value {
            Value::Object(entries) => Ok(entries),
            Value::Null => Ok(Map::new()),
            _ => Err(not_found(
                set,
                format!("{} is not a mapping of entity IDs", path.display()),
            )),
        }
    }
}

impl MetadataProvider for FileMetadataProvider {
    fn hosted_metadata(&self, set: MetadataSet) -> Result<DeploymentConfig> {
        let entries = self.load_set(set)?;
        let (entity_id, entry) = select_hosted(&entries, self.host.as_deref())
            .ok_or_else(|| not_found(set, "no hosted entry matches this host".to_string()))?;

        tracing::debug!("Using hosted {} entry '{}'", set, entity_id);
        let mut metadata = DeploymentConfig::from_value(entry.clone())?;
        metadata.set_default("entityid", entity_id.clone());
        Ok(metadata)
    }
}

/// Pick the hosted entry: host match, then the default host, then a sole entry.
fn select_hosted<'a>(
    entries: &'a Map<String, Value>,
    host: Option<&str>,
) -> Option<(&'a String, &'a Value)> {
    let host_of = |entry: &Value| entry.get("host").and_then(Value::as_str).map(str::to_owned);

    if let Some(host) = host {
        if let Some(found) = entries
            .iter()
            .find(|(_, e)| host_of(e).as_deref() == Some(host))
        {
            return Some(found);
        }
    }

    if let Some(found) = entries
        .iter()
        .find(|(_, e)| host_of(e).as_deref() == Some(DEFAULT_HOST))
    {
        return Some(found);
    }

    if entries.len() == 1 {
        return entries.iter().next();
    }

    None
}

fn not_found(set: MetadataSet, message: String) -> HealthError {
    HealthError::MetadataNotFound {
        set: set.as_str().to_string(),
        message,
    }
}

/// Metadata held in memory, keyed by set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    entries: HashMap<MetadataSet, DeploymentConfig>,
}

impl InMemoryMetadata {
    /// A store with no hosted entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the hosted entry of a set.
    pub fn with(mut self, set: MetadataSet, entry: DeploymentConfig) -> Self {
        self.entries.insert(set, entry);
        self
    }
}

impl MetadataProvider for InMemoryMetadata {
    fn hosted_metadata(&self, set: MetadataSet) -> Result<DeploymentConfig> {
        self.entries
            .get(&set)
            .cloned()
            .ok_or_else(|| not_found(set, "no entry".to_string()))
    }
}
