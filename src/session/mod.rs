//! Session-scoped caching.
//!
//! The release check remembers the latest known release per administrator
//! session so that repeated page loads do not hit the network.

mod cache;
mod store;

pub use cache::{MemorySessionCache, SessionScopedCache};
pub use store::FileSessionCache;

/// Session used when none is given.
pub const DEFAULT_SESSION: &str = "default";

/// Default directory for session records.
pub fn default_state_dir() -> std::path::PathBuf {
    std::env::temp_dir().join("samlhealth").join("sessions")
}
