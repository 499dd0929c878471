//! Error types for samlhealth operations.
//!
//! This module defines [`HealthError`], the error type used at the edges of
//! the diagnostics engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - The engine itself never fails: missing capabilities, broken metadata,
//!   unreadable keys and network trouble all degrade to an unsatisfied check
//!   or an omitted warning.
//! - `HealthError` is returned by collaborators (config loading, metadata
//!   lookup, key loading) so the engine can decide how to degrade.
//! - Use `anyhow::Error` (via `HealthError::Other`) for unexpected errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for samlhealth operations.
#[derive(Debug, Error)]
pub enum HealthError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// A known configuration option holds a value of the wrong type.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Hosted metadata for the requested set is absent or unusable.
    #[error("No hosted metadata for '{set}': {message}")]
    MetadataNotFound { set: String, message: String },

    /// Key material the configuration refers to could not be loaded.
    ///
    /// The message names the option and file, never the key contents.
    #[error("Failed to load {what}: {message}")]
    KeyLoadFailed { what: String, message: String },

    /// A session identifier that cannot name a cache file.
    #[error("Invalid session id '{id}': use letters, digits, '-' and '_'")]
    InvalidSessionId { id: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for samlhealth operations.
pub type Result<T> = std::result::Result<T, HealthError>;
