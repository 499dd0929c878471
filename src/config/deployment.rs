//! Read-only accessor over a deployment's configuration values.
//!
//! Configuration is a flat mapping of dotted option names
//! (`enable.saml20-idp`, `store.type`) to JSON-compatible values. The same
//! accessor wraps a hosted metadata entry, whose options (`privatekey`,
//! `certificate`, ...) are read through the identical getters.
//!
//! Known options are type-checked once in [`DeploymentConfig::from_value`],
//! so the getters below never fail: an absent or `null` option yields the
//! supplied default.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::{HealthError, Result};

/// Options that must hold a boolean when present.
const BOOLEAN_OPTIONS: &[&str] = &[
    "admin.checkforupdates",
    "enable.saml20-idp",
    "metadata.sign.enable",
];

/// Options that must hold a string when present.
const STRING_OPTIONS: &[&str] = &[
    "auth.adminpassword",
    "technicalcontact_email",
    "store.type",
    "proxy",
    "version",
    "basedir",
    "certdir",
    "metadatadir",
    "baseurlpath",
];

/// Modules that are enabled unless `module.enable` says otherwise.
const DEFAULT_ENABLED_MODULES: &[&str] = &["core", "admin", "saml"];

/// Running version reported by development checkouts.
pub const DEVELOPMENT_VERSION: &str = "master";

/// Configuration of a SAML deployment (or of one hosted metadata entry).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentConfig {
    values: Map<String, Value>,
}

impl DeploymentConfig {
    /// Create an empty configuration; every getter returns its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from a parsed document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidationError` if the document is not a mapping, or
    /// if a known option holds a value of the wrong type.
    pub fn from_value(value: Value) -> Result<Self> {
        let values = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(HealthError::ConfigValidationError {
                    message: format!("expected a mapping of options, found {}", kind(&other)),
                })
            }
        };

        let config = Self { values };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for key in BOOLEAN_OPTIONS {
            match self.values.get(*key) {
                None | Some(Value::Null) | Some(Value::Bool(_)) => {}
                Some(other) => return Err(type_error(key, "a boolean", other)),
            }
        }

        for key in STRING_OPTIONS {
            match self.values.get(*key) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(other) => return Err(type_error(key, "a string", other)),
            }
        }

        match self.values.get("module.enable") {
            None | Some(Value::Null) => {}
            Some(Value::Object(modules)) => {
                for (name, flag) in modules {
                    if !flag.is_boolean() {
                        return Err(type_error(
                            &format!("module.enable.{}", name),
                            "a boolean",
                            flag,
                        ));
                    }
                }
            }
            Some(other) => return Err(type_error("module.enable", "a mapping", other)),
        }

        Ok(())
    }

    /// Set an option, returning the updated configuration.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set an option only if it is not already present.
    pub(crate) fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        if !self.has(key) {
            self.values.insert(key.to_string(), value.into());
        }
    }

    /// Whether an option is present with a non-null value.
    pub fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Raw value of an option, `None` if absent or `null`.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    /// String value of an option, if it holds a string.
    pub fn optional_string(&self, key: &str) -> Option<String> {
        match self.value(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                tracing::debug!("Option '{}' is {}, not a string", key, kind(other));
                None
            }
            None => None,
        }
    }

    /// String value of an option, or `default`.
    pub fn string(&self, key: &str, default: &str) -> String {
        self.optional_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Boolean value of an option, or `default`.
    pub fn boolean(&self, key: &str, default: bool) -> bool {
        match self.value(key) {
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                tracing::debug!("Option '{}' is {}, not a boolean", key, kind(other));
                default
            }
            None => default,
        }
    }

    /// Version of the deployment software.
    ///
    /// Set by the `version` option, or by the loaders from the `version`
    /// field of `<basedir>/composer.json`. Development checkouts report
    /// [`DEVELOPMENT_VERSION`], which is also assumed when neither is present.
    pub fn version(&self) -> String {
        self.string("version", DEVELOPMENT_VERSION)
    }

    /// Installation root used to resolve relative paths.
    pub fn base_dir(&self) -> PathBuf {
        PathBuf::from(self.string("basedir", "."))
    }

    /// Directory holding certificates and private keys.
    pub fn cert_dir(&self) -> PathBuf {
        self.resolve_path(&self.string("certdir", "cert/"))
    }

    /// Resolve a path option relative to the base directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            path
        } else {
            self.base_dir().join(path)
        }
    }

    /// Whether a module is enabled through `module.enable`.
    pub fn is_module_enabled(&self, module: &str) -> bool {
        let configured = self
            .value("module.enable")
            .and_then(Value::as_object)
            .and_then(|modules| modules.get(module))
            .and_then(Value::as_bool);

        configured.unwrap_or_else(|| DEFAULT_ENABLED_MODULES.contains(&module))
    }
}

fn type_error(key: &str, expected: &str, found: &Value) -> HealthError {
    HealthError::ConfigValidationError {
        message: format!("option '{}' must be {}, found {}", key, expected, kind(found)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
