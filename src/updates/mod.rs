//! Release freshness checking.
//!
//! This module provides:
//! - Semantic version comparison
//! - A blocking HTTP fetcher abstraction
//! - Session-cached lookup of the latest upstream release

pub mod fetch;
pub mod release;
pub mod version;

pub use fetch::{FetchError, FetchRequest, FetchResponse, HttpFetcher, ProxySettings, ReqwestFetcher};
pub use release::{latest_release, proxy_from_config, CachedVersionInfo, RELEASES_API};
pub use version::{compare_versions, is_newer_version, satisfies_minimum};
