//! Deployment configuration access and loading.
//!
//! - [`deployment`] - Typed, read-only accessor over configuration options
//! - [`loader`] - Loading configuration from YAML/JSON files or `config.php`

pub mod deployment;
pub mod loader;

pub use deployment::{DeploymentConfig, DEVELOPMENT_VERSION};
pub use loader::{load_config_file, load_php_config, parse_config};
