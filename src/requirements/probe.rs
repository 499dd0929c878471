//! Capability probe for the deployment's runtime.
//!
//! A capability is a function, class or extension of the PHP runtime that
//! hosts the identity provider. Whether it is present is a plain `bool`:
//! absence is a normal answer, never an error. Probes are side-effect free
//! and repeatable, so the prerequisite matrix can be rebuilt on every run
//! without caching.
//!
//! # Example
//!
//! ```
//! use samlhealth::requirements::probe::{CapabilityProbe, FeatureId, StaticProbe};
//!
//! let probe = StaticProbe::new()
//!     .with(FeatureId::Json)
//!     .with_version("8.2.7");
//! assert!(probe.available(FeatureId::Json));
//! assert!(!probe.available(FeatureId::Ldap));
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// How a capability is looked up on the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// A global function.
    Function,
    /// A class (from an extension or a bundled library).
    Class,
    /// A loaded extension.
    Extension,
}

/// A runtime capability the diagnostics know how to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureId {
    DateTime,
    Hashing,
    Zlib,
    OpenSslSigning,
    XmlDom,
    Regex,
    Json,
    Spl,
    Multibyte,
    Curl,
    Session,
    Pdo,
    Ldap,
    Radius,
    Predis,
    Memcache,
    Memcached,
    Suhosin,
}

impl FeatureId {
    /// Every known capability.
    pub const ALL: [FeatureId; 18] = [
        FeatureId::DateTime,
        FeatureId::Hashing,
        FeatureId::Zlib,
        FeatureId::OpenSslSigning,
        FeatureId::XmlDom,
        FeatureId::Regex,
        FeatureId::Json,
        FeatureId::Spl,
        FeatureId::Multibyte,
        FeatureId::Curl,
        FeatureId::Session,
        FeatureId::Pdo,
        FeatureId::Ldap,
        FeatureId::Radius,
        FeatureId::Predis,
        FeatureId::Memcache,
        FeatureId::Memcached,
        FeatureId::Suhosin,
    ];

    /// How this capability is looked up.
    pub fn kind(self) -> FeatureKind {
        match self {
            FeatureId::Predis | FeatureId::Memcache | FeatureId::Memcached => FeatureKind::Class,
            FeatureId::Suhosin => FeatureKind::Extension,
            _ => FeatureKind::Function,
        }
    }

    /// The runtime symbol whose presence proves the capability.
    pub fn symbol(self) -> &'static str {
        match self {
            FeatureId::DateTime => "time",
            FeatureId::Hashing => "hash",
            FeatureId::Zlib => "gzinflate",
            FeatureId::OpenSslSigning => "openssl_sign",
            FeatureId::XmlDom => "dom_import_simplexml",
            FeatureId::Regex => "preg_match",
            FeatureId::Json => "json_decode",
            FeatureId::Spl => "class_implements",
            FeatureId::Multibyte => "mb_strlen",
            FeatureId::Curl => "curl_init",
            FeatureId::Session => "session_start",
            FeatureId::Pdo => "pdo_drivers",
            FeatureId::Ldap => "ldap_bind",
            FeatureId::Radius => "radius_auth_open",
            FeatureId::Predis => "\\Predis\\Client",
            FeatureId::Memcache => "\\Memcache",
            FeatureId::Memcached => "\\Memcached",
            FeatureId::Suhosin => "suhosin",
        }
    }
}

/// Answers questions about the runtime hosting the deployment.
pub trait CapabilityProbe {
    /// Whether a capability is available.
    fn available(&self, feature: FeatureId) -> bool;

    /// Version of the runtime, if it can be determined.
    fn platform_version(&self) -> Option<String>;

    /// Value of a runtime setting (ini option), `None` if unset or empty.
    fn setting(&self, name: &str) -> Option<String>;
}

/// Probes a PHP interpreter by running one-line scripts against it.
///
/// Each query spawns the interpreter once. A missing binary, a non-zero
/// exit or unexpected output all count as "not available".
///
/// Libraries installed through Composer are only visible to class lookups
/// once the deployment's `vendor/autoload.php` is loaded; see
/// [`InterpreterProbe::with_base_dir`].
#[derive(Debug, Clone)]
pub struct InterpreterProbe {
    binary: PathBuf,
    autoloader: Option<PathBuf>,
}

impl InterpreterProbe {
    /// Probe the given interpreter binary (resolved through PATH if bare).
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            autoloader: None,
        }
    }

    /// Load `<base_dir>/vendor/autoload.php` before class lookups, if it exists.
    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        let autoloader = base_dir.as_ref().join("vendor").join("autoload.php");
        if autoloader.is_file() {
            self.autoloader = Some(autoloader);
        } else {
            tracing::debug!("No Composer autoloader at {}", autoloader.display());
        }
        self
    }

    /// The interpreter binary being probed.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// The autoloader class lookups load, if any.
    pub fn autoloader(&self) -> Option<&Path> {
        self.autoloader.as_deref()
    }

    /// Run a script and return its trimmed stdout on success.
    fn run_script(&self, script: &str) -> Option<String> {
        self.run_script_with_args(script, &[])
    }

    /// Run a script with arguments available as `$argv[1..]`.
    fn run_script_with_args(&self, script: &str, args: &[&Path]) -> Option<String> {
        let mut command = Command::new(&self.binary);
        command.arg("-r").arg(script);
        if !args.is_empty() {
            command.arg("--").args(args);
        }
        let output = command
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => {
                Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
            }
            Ok(out) => {
                tracing::debug!("{} exited with {}", self.binary.display(), out.status);
                None
            }
            Err(e) => {
                tracing::debug!("Cannot run {}: {}", self.binary.display(), e);
                None
            }
        }
    }
}

impl Default for InterpreterProbe {
    fn default() -> Self {
        Self::new("php")
    }
}

impl CapabilityProbe for InterpreterProbe {
    fn available(&self, feature: FeatureId) -> bool {
        let lookup = match feature.kind() {
            FeatureKind::Function => "function_exists",
            FeatureKind::Class => "class_exists",
            FeatureKind::Extension => "extension_loaded",
        };
        let script = format!("echo {}('{}') ? '1' : '0';", lookup, feature.symbol());

        let output = match (feature.kind(), self.autoloader.as_deref()) {
            (FeatureKind::Class, Some(autoloader)) => self.run_script_with_args(
                &format!("require $argv[1]; {}", script),
                &[autoloader],
            ),
            _ => self.run_script(&script),
        };
        let present = output.as_deref() == Some("1");
        tracing::debug!("Capability {:?} ({}) available: {}", feature, feature.symbol(), present);
        present
    }

    fn platform_version(&self) -> Option<String> {
        self.run_script("echo PHP_VERSION;")
            .filter(|v| !v.is_empty())
    }

    fn setting(&self, name: &str) -> Option<String> {
        if !is_setting_name(name) {
            tracing::debug!("Refusing to query malformed setting name {:?}", name);
            return None;
        }
        self.run_script(&format!("echo ini_get('{}');", name))
            .filter(|v| !v.is_empty())
    }
}

/// Setting names are dotted identifiers; anything else is not queried.
fn is_setting_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

/// A probe answering from a fixed truth table.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    available: HashSet<FeatureId>,
    version: Option<String>,
    settings: HashMap<String, String>,
}

impl StaticProbe {
    /// A probe where nothing is available and the version is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// A probe where every known capability is available.
    pub fn all() -> Self {
        Self::new().with_all(FeatureId::ALL)
    }

    /// Mark a capability as available.
    pub fn with(mut self, feature: FeatureId) -> Self {
        self.available.insert(feature);
        self
    }

    /// Mark several capabilities as available.
    pub fn with_all(mut self, features: impl IntoIterator<Item = FeatureId>) -> Self {
        self.available.extend(features);
        self
    }

    /// Mark a capability as absent.
    pub fn without(mut self, feature: FeatureId) -> Self {
        self.available.remove(&feature);
        self
    }

    /// Set the reported runtime version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set a runtime setting.
    pub fn with_setting(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(name.into(), value.into());
        self
    }
}

impl CapabilityProbe for StaticProbe {
    fn available(&self, feature: FeatureId) -> bool {
        self.available.contains(&feature)
    }

    fn platform_version(&self) -> Option<String> {
        self.version.clone()
    }

    fn setting(&self, name: &str) -> Option<String> {
        self.settings.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_kinds() {
        assert_eq!(FeatureId::Json.kind(), FeatureKind::Function);
        assert_eq!(FeatureId::Memcached.kind(), FeatureKind::Class);
        assert_eq!(FeatureId::Predis.kind(), FeatureKind::Class);
        assert_eq!(FeatureId::Suhosin.kind(), FeatureKind::Extension);
    }

    #[test]
    fn feature_symbols_are_unique() {
        let symbols: HashSet<&str> = FeatureId::ALL.iter().map(|f| f.symbol()).collect();
        assert_eq!(symbols.len(), FeatureId::ALL.len());
    }

    #[test]
    fn static_probe_answers_from_table() {
        let probe = StaticProbe::new().with(FeatureId::Curl).with(FeatureId::Pdo);
        assert!(probe.available(FeatureId::Curl));
        assert!(probe.available(FeatureId::Pdo));
        assert!(!probe.available(FeatureId::Ldap));
        assert!(probe.platform_version().is_none());
    }

    #[test]
    fn static_probe_all_and_without() {
        let probe = StaticProbe::all().without(FeatureId::Suhosin);
        assert!(probe.available(FeatureId::Radius));
        assert!(!probe.available(FeatureId::Suhosin));
    }

    #[test]
    fn static_probe_is_repeatable() {
        let probe = StaticProbe::new().with(FeatureId::Zlib);
        for _ in 0..3 {
            assert!(probe.available(FeatureId::Zlib));
            assert!(!probe.available(FeatureId::XmlDom));
        }
    }

    #[test]
    fn static_probe_empty_setting_is_unset() {
        let probe = StaticProbe::new()
            .with_setting("suhosin.get.max_value_length", "")
            .with_setting("memory_limit", "128M");
        assert!(probe.setting("suhosin.get.max_value_length").is_none());
        assert_eq!(probe.setting("memory_limit").as_deref(), Some("128M"));
    }

    #[test]
    fn interpreter_probe_missing_binary_is_absent_not_error() {
        let probe = InterpreterProbe::new("/nonexistent/bin/php");
        assert!(!probe.available(FeatureId::Json));
        assert!(probe.platform_version().is_none());
        assert!(probe.setting("memory_limit").is_none());
    }

    #[test]
    fn setting_names_are_validated() {
        assert!(is_setting_name("suhosin.get.max_value_length"));
        assert!(!is_setting_name("x'); system('id"));
        assert!(!is_setting_name(""));
    }

    #[cfg(unix)]
    mod fake_interpreter {
        use super::super::*;
        use std::fs;
        use tempfile::TempDir;

        /// Write a shell script standing in for the interpreter.
        fn fake_php(dir: &Path) -> PathBuf {
            use std::os::unix::fs::PermissionsExt;
            let path = dir.join("php");
            fs::write(
                &path,
                r#"#!/bin/sh
case "$2" in
  *"function_exists('json_decode')"*) echo 1 ;;
  *"class_exists('\Memcached')"*) echo 1 ;;
  *function_exists*|*class_exists*|*extension_loaded*) echo 0 ;;
  *PHP_VERSION*) echo 8.2.7 ;;
  *"ini_get('suhosin.get.max_value_length')"*) echo 512 ;;
  *ini_get*) echo "" ;;
  *) exit 1 ;;
esac
"#,
            )
            .unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn probes_functions_and_classes() {
            let temp = TempDir::new().unwrap();
            let probe = InterpreterProbe::new(fake_php(temp.path()));

            assert!(probe.available(FeatureId::Json));
            assert!(probe.available(FeatureId::Memcached));
            assert!(!probe.available(FeatureId::Ldap));
            assert!(!probe.available(FeatureId::Suhosin));
        }

        /// An interpreter that only knows `\Predis\Client` once the
        /// autoloader passed as `$argv[1]` has been required.
        fn composer_php(dir: &Path) -> PathBuf {
            use std::os::unix::fs::PermissionsExt;
            let path = dir.join("composer-php");
            fs::write(
                &path,
                r#"#!/bin/sh
case "$2" in
  'require $argv[1]; '*"class_exists('\Predis\Client')"*)
    if [ "$3" = "--" ] && [ -f "$4" ]; then echo 1; else echo 0; fi ;;
  *) echo 0 ;;
esac
"#,
            )
            .unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn class_lookups_load_composer_autoloader() {
            let temp = TempDir::new().unwrap();
            let base = temp.path().join("simplesamlphp");
            fs::create_dir_all(base.join("vendor")).unwrap();
            fs::write(base.join("vendor").join("autoload.php"), "<?php\n").unwrap();

            let php = composer_php(temp.path());
            let probe = InterpreterProbe::new(&php).with_base_dir(&base);
            assert_eq!(
                probe.autoloader(),
                Some(base.join("vendor").join("autoload.php").as_path())
            );
            assert!(probe.available(FeatureId::Predis));
            assert!(!probe.available(FeatureId::Json));

            let bare = InterpreterProbe::new(&php);
            assert!(!bare.available(FeatureId::Predis));
        }

        #[test]
        fn missing_autoloader_is_skipped() {
            let temp = TempDir::new().unwrap();
            let probe = InterpreterProbe::new(fake_php(temp.path())).with_base_dir(temp.path());
            assert!(probe.autoloader().is_none());
            assert!(probe.available(FeatureId::Memcached));
        }

        #[test]
        fn probes_version_and_settings() {
            let temp = TempDir::new().unwrap();
            let probe = InterpreterProbe::new(fake_php(temp.path()));

            assert_eq!(probe.platform_version().as_deref(), Some("8.2.7"));
            assert_eq!(
                probe.setting("suhosin.get.max_value_length").as_deref(),
                Some("512")
            );
            assert!(probe.setting("memory_limit").is_none());
        }
    }
}
