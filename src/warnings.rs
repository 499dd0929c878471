//! Deployment warnings.
//!
//! Warnings are advisory: unlike failed prerequisites they never make the
//! deployment unhealthy. They are collected in a fixed order (transport,
//! secret salt, request size limit, release freshness).

use crate::config::{DeploymentConfig, DEVELOPMENT_VERSION};
use crate::message::Message;
use crate::requirements::probe::{CapabilityProbe, FeatureId};
use crate::session::SessionScopedCache;
use crate::updates::fetch::HttpFetcher;
use crate::updates::release::{latest_release, proxy_from_config, RELEASES_API};
use crate::updates::version::is_newer_version;

/// The administrator reached the deployment over plain HTTP.
pub const NOT_HTTPS: &str = "You are not using HTTPS to protect communications with your users. \
HTTP works fine for testing purposes, but in a production environment you should use HTTPS. \
Read more about the maintenance of SimpleSAMLphp: \
https://simplesamlphp.org/docs/stable/simplesamlphp-maintenance";

/// `secretsalt` is still the shipped placeholder.
pub const DEFAULT_SECRET_SALT: &str = "The configuration uses the default secret salt. \
Make sure to modify the secretsalt option in the SimpleSAMLphp configuration in production environments. \
Read more about the maintenance of SimpleSAMLphp: \
https://simplesamlphp.org/docs/stable/simplesamlphp-install";

/// Suhosin caps query values below what SAML redirects need.
pub const SUHOSIN_LIMIT: &str = "The length of query parameters is limited by the PHP Suhosin extension. \
Please increase the suhosin.get.max_value_length option in your php.ini to at least 2048 bytes.";

/// The release check cannot run without cURL.
pub const CURL_MISSING: &str =
    "The cURL PHP extension is missing. Cannot check for SimpleSAMLphp updates.";

/// A newer release exists; `%latest%` is its page URL.
pub const OUTDATED_VERSION: &str = "You are running an outdated version of SimpleSAMLphp. \
Please update to the latest version as soon as possible: %latest%";

/// Placeholder salt shipped in the default configuration.
const PLACEHOLDER_SALT: &str = "defaultsecretsalt";

/// Smallest acceptable `suhosin.get.max_value_length`.
const MIN_QUERY_VALUE_LENGTH: i64 = 2048;

/// How the administrator reached the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportInfo {
    /// Whether the connection is TLS-protected.
    pub encrypted: bool,
}

impl TransportInfo {
    /// Transport with the given TLS state.
    pub fn new(encrypted: bool) -> Self {
        Self { encrypted }
    }

    /// Transport implied by an absolute URL, `None` for anything else.
    pub fn from_url(url: &str) -> Option<Self> {
        let (scheme, rest) = url.trim().split_once("://")?;
        if rest.is_empty() {
            return None;
        }
        match scheme.to_ascii_lowercase().as_str() {
            "https" => Some(Self::new(true)),
            "http" => Some(Self::new(false)),
            _ => None,
        }
    }

    /// Transport implied by an absolute `baseurlpath`.
    pub fn from_config(config: &DeploymentConfig) -> Option<Self> {
        config
            .optional_string("baseurlpath")
            .and_then(|base| Self::from_url(&base))
    }
}

/// Collects deployment warnings.
pub struct DeploymentWarningAggregator<'a> {
    probe: &'a dyn CapabilityProbe,
    releases_url: String,
}

impl<'a> DeploymentWarningAggregator<'a> {
    /// Aggregator querying the public GitHub releases endpoint.
    pub fn new(probe: &'a dyn CapabilityProbe) -> Self {
        Self {
            probe,
            releases_url: RELEASES_API.to_string(),
        }
    }

    /// Query a different releases endpoint.
    pub fn releases_url(mut self, url: impl Into<String>) -> Self {
        self.releases_url = url.into();
        self
    }

    /// Collect the warnings that apply, in presentation order.
    pub fn collect(
        &self,
        config: &DeploymentConfig,
        transport: &TransportInfo,
        cache: &mut dyn SessionScopedCache,
        fetcher: &dyn HttpFetcher,
    ) -> Vec<Message> {
        let mut warnings = Vec::new();

        if !transport.encrypted {
            warnings.push(Message::plain(NOT_HTTPS));
        }

        if config.optional_string("secretsalt").as_deref() == Some(PLACEHOLDER_SALT) {
            warnings.push(Message::plain(DEFAULT_SECRET_SALT));
        }

        if self.query_length_limited() {
            warnings.push(Message::plain(SUHOSIN_LIMIT));
        }

        if let Some(warning) = self.release_warning(config, cache, fetcher) {
            warnings.push(warning);
        }

        warnings
    }

    fn query_length_limited(&self) -> bool {
        if !self.probe.available(FeatureId::Suhosin) {
            return false;
        }
        self.probe
            .setting("suhosin.get.max_value_length")
            .and_then(|len| len.trim().parse::<i64>().ok())
            .is_none_or(|len| len < MIN_QUERY_VALUE_LENGTH)
    }

    fn release_warning(
        &self,
        config: &DeploymentConfig,
        cache: &mut dyn SessionScopedCache,
        fetcher: &dyn HttpFetcher,
    ) -> Option<Message> {
        let running = config.version();
        if !config.boolean("admin.checkforupdates", true) || running == DEVELOPMENT_VERSION {
            return None;
        }

        if !self.probe.available(FeatureId::Curl) {
            return Some(Message::plain(CURL_MISSING));
        }

        let latest = latest_release(cache, fetcher, &self.releases_url, proxy_from_config(config))?;
        if is_newer_version(&latest.tag_name, &running) {
            tracing::debug!("Running {}, latest release is {}", running, latest.tag_name);
            Some(Message::with_params(
                OUTDATED_VERSION,
                [("%latest%", latest.html_url)],
            ))
        } else {
            None
        }
    }
}
