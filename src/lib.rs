//! samlhealth - Installation health diagnostics for SimpleSAMLphp.
//!
//! samlhealth inspects a SimpleSAMLphp deployment's runtime capabilities,
//! configuration and signing keys, and reports a prerequisite matrix plus a
//! list of deployment warnings.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Deployment configuration loading and typed access
//! - [`crypto`] - Key material loading and key-pair correspondence
//! - [`error`] - Error types and result aliases
//! - [`message`] - Translatable messages with placeholders
//! - [`metadata`] - Hosted metadata lookup
//! - [`report`] - The combined health report
//! - [`requirements`] - Capability probes and the prerequisite matrix
//! - [`session`] - Session-scoped caching
//! - [`ui`] - Terminal output
//! - [`updates`] - Version comparison and the upstream release check
//! - [`warnings`] - Deployment warnings
//!
//! # Example
//!
//! ```
//! use samlhealth::config::DeploymentConfig;
//! use samlhealth::requirements::{RequirementLevel, StaticProbe};
//! use samlhealth::requirements::PrerequisiteMatrixBuilder;
//! use samlhealth::crypto::FileKeyLoader;
//! use samlhealth::metadata::InMemoryMetadata;
//!
//! let probe = StaticProbe::all().with_version("8.2.7");
//! let config = DeploymentConfig::new().with("store.type", "sql");
//!
//! let matrix = PrerequisiteMatrixBuilder::new(&probe).build(
//!     &config,
//!     &InMemoryMetadata::new(),
//!     &FileKeyLoader::from_config(&config),
//! );
//! let pdo = matrix.find("PDO extension").unwrap();
//! assert_eq!(pdo.level(), RequirementLevel::Required);
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod message;
pub mod metadata;
pub mod report;
pub mod requirements;
pub mod session;
pub mod ui;
pub mod updates;
pub mod warnings;

pub use error::{HealthError, Result};
