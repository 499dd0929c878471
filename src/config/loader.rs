//! Deployment configuration loading.
//!
//! Configuration can be read from a YAML or JSON export of the deployment's
//! options, or taken straight from a PHP `config.php` by asking the
//! interpreter to encode its `$config` array as JSON.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;

use crate::config::deployment::DeploymentConfig;
use crate::error::{HealthError, Result};

/// Script that prints the `$config` array of the file named in `$argv[1]`.
const EXPORT_CONFIG_SCRIPT: &str =
    "$config = []; require $argv[1]; echo json_encode($config, JSON_UNESCAPED_SLASHES);";

/// Load a YAML or JSON configuration file.
///
/// When the file does not set `basedir`, the directory containing the file
/// is used so that relative `certdir` and `metadatadir` options resolve
/// next to it.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the document is not valid YAML/JSON.
/// Returns `ConfigValidationError` if a known option has the wrong type.
pub fn load_config_file(path: &Path) -> Result<DeploymentConfig> {
    if !path.exists() {
        return Err(HealthError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content, path)?;
    set_base_dir(&mut config, path);
    set_installed_version(&mut config);

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse configuration content. The path is only used for error messages.
pub fn parse_config(content: &str, path: &Path) -> Result<DeploymentConfig> {
    let value: Value =
        serde_yaml::from_str(content).map_err(|e| HealthError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    DeploymentConfig::from_value(value)
}

/// Load a PHP `config.php` through the interpreter at `php`.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist, `Io` if the
/// interpreter cannot be started, and `ConfigParseError` if it exits with
/// an error or prints something other than a JSON object.
pub fn load_php_config(php: &Path, path: &Path) -> Result<DeploymentConfig> {
    if !path.exists() {
        return Err(HealthError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new(php)
        .arg("-r")
        .arg(EXPORT_CONFIG_SCRIPT)
        .arg("--")
        .arg(path)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(HealthError::ConfigParseError {
            path: path.to_path_buf(),
            message: format!(
                "{} exited with {}: {}",
                php.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: Value =
        serde_json::from_str(stdout.trim()).map_err(|e| HealthError::ConfigParseError {
            path: path.to_path_buf(),
            message: format!("interpreter output is not JSON: {}", e),
        })?;

    let mut config = DeploymentConfig::from_value(value)?;
    // config.php lives in <basedir>/config/
    if let Some(base) = path.parent().and_then(Path::parent) {
        config.set_default("basedir", base.to_string_lossy().into_owned());
    }
    set_installed_version(&mut config);
    Ok(config)
}

fn set_base_dir(config: &mut DeploymentConfig, path: &Path) {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    config.set_default("basedir", dir.to_string_lossy().into_owned());
}

/// Take `version` from `<basedir>/composer.json` unless the configuration
/// already sets it.
fn set_installed_version(config: &mut DeploymentConfig) {
    if config.has("version") {
        return;
    }

    let manifest = config.base_dir().join("composer.json");
    let Ok(content) = fs::read_to_string(&manifest) else {
        return;
    };
    let version = serde_json::from_str::<Value>(&content)
        .ok()
        .and_then(|value| value.get("version")?.as_str().map(str::to_string));
    match version {
        Some(version) => {
            let version = version.trim_start_matches('v').to_string();
            tracing::debug!("Installed version {} from {}", version, manifest.display());
            config.set_default("version", version);
        }
        None => tracing::debug!("No version in {}", manifest.display()),
    }
}
