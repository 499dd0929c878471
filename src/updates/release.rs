//! Latest upstream release lookup.
//!
//! The answer is cached per session under
//! [`LATEST_VERSION_NAMESPACE`]/[`LATEST_VERSION_FIELD`] and never expires,
//! so a long-lived session keeps reporting the release it first saw.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::fetch::{FetchRequest, HttpFetcher, ProxySettings};
use crate::config::DeploymentConfig;
use crate::session::SessionScopedCache;

/// GitHub API endpoint describing the latest release.
pub const RELEASES_API: &str =
    "https://api.github.com/repos/simplesamlphp/simplesamlphp/releases/latest";

/// Session cache namespace of the release record.
pub const LATEST_VERSION_NAMESPACE: &str = "core:latest_simplesamlphp_version";
/// Session cache field of the release record.
pub const LATEST_VERSION_FIELD: &str = "version";

/// User agent sent to the releases endpoint.
pub const USER_AGENT: &str = "SimpleSAMLphp";

/// Upper bound on the release request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// The two release fields that are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedVersionInfo {
    /// Release tag, e.g. `v2.3.1`.
    pub tag_name: String,
    /// Release page.
    pub html_url: String,
}

/// Outbound proxy from the `proxy` and `proxy.auth` options.
pub fn proxy_from_config(config: &DeploymentConfig) -> Option<ProxySettings> {
    config.optional_string("proxy").map(|url| ProxySettings {
        url,
        auth: config.optional_string("proxy.auth"),
    })
}

/// Latest release, from the session cache or else from `url`.
///
/// A successful fetch is written back to the cache. Any failure yields
/// `None` and leaves the cache untouched.
pub fn latest_release(
    cache: &mut dyn SessionScopedCache,
    fetcher: &dyn HttpFetcher,
    url: &str,
    proxy: Option<ProxySettings>,
) -> Option<CachedVersionInfo> {
    if let Some(cached) = cache.get(LATEST_VERSION_NAMESPACE, LATEST_VERSION_FIELD) {
        match serde_json::from_value::<CachedVersionInfo>(cached) {
            Ok(info) => {
                tracing::debug!("Using cached release {}", info.tag_name);
                return Some(info);
            }
            Err(e) => tracing::debug!("Ignoring malformed cached release: {}", e),
        }
    }

    let request = FetchRequest::new(url, USER_AGENT)
        .with_timeout(FETCH_TIMEOUT)
        .with_proxy(proxy);

    let response = match fetcher.get(&request) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Release check skipped: {}", e);
            return None;
        }
    };

    if response.status != 200 {
        tracing::warn!("Release check skipped: {} returned {}", url, response.status);
        return None;
    }

    let info: CachedVersionInfo = match serde_json::from_str(&response.body) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!("Release check skipped: malformed response: {}", e);
            return None;
        }
    };

    match serde_json::to_value(&info) {
        Ok(value) => cache.set(LATEST_VERSION_NAMESPACE, LATEST_VERSION_FIELD, value),
        Err(e) => tracing::debug!("Not caching release info: {}", e),
    }
    Some(info)
}
