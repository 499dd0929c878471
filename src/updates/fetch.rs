//! Blocking HTTP GET used by the release check.

use std::time::Duration;

use thiserror::Error;

/// Outbound proxy for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    /// Proxy URL, e.g. `http://proxy.example.org:3128`.
    pub url: String,
    /// Basic credentials as `user:password`.
    pub auth: Option<String>,
}

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<ProxySettings>,
}

impl FetchRequest {
    /// A request with a 10 second timeout and no proxy.
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            user_agent: user_agent.into(),
            proxy: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<ProxySettings>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a request produced no response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The client or proxy could not be set up.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No response within the timeout.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Connection or transfer failure.
    #[error("Request to {url} failed: {message}")]
    Unavailable { url: String, message: String },
}

/// Performs blocking GET requests.
pub trait HttpFetcher {
    /// Send the request and wait for the full response.
    ///
    /// Non-2xx statuses are responses, not errors.
    fn get(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// [`HttpFetcher`] backed by `reqwest`'s blocking client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher;

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self
    }

    fn client(&self, request: &FetchRequest) -> Result<reqwest::blocking::Client, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(request.user_agent.as_str())
            .timeout(request.timeout);

        if let Some(settings) = &request.proxy {
            let mut proxy = reqwest::Proxy::all(settings.url.as_str())
                .map_err(|e| FetchError::InvalidRequest(format!("proxy: {}", e)))?;
            if let Some(auth) = &settings.auth {
                let (user, password) = auth.split_once(':').unwrap_or((auth.as_str(), ""));
                proxy = proxy.basic_auth(user, password);
            }
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))
    }
}

impl HttpFetcher for ReqwestFetcher {
    fn get(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let client = self.client(request)?;
        tracing::debug!("GET {}", request.url);

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                FetchError::Unavailable {
                    url: request.url.clone(),
                    message: e.to_string(),
                }
            }
        };

        let response = client.get(request.url.as_str()).send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;

        tracing::debug!("GET {} returned {}", request.url, status);
        Ok(FetchResponse { status, body })
    }
}
