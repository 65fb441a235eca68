//! Template retrieval

use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

/// Errors raised while retrieving a template payload
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Raw response to a payload request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPayload {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchedPayload {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Successful response carrying `body`
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to retrieve the bytes behind a payload URL
pub trait TemplateFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPayload, FetchError>;
}

impl<F> TemplateFetcher for F
where
    F: Fn(&str) -> Result<FetchedPayload, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<FetchedPayload, FetchError> {
        self(url)
    }
}

/// Options for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches payloads over HTTP(S) with a single GET, no retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl TemplateFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPayload, FetchError> {
        let response = self.client.get(url).send().map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(FetchedPayload::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_fetcher() {
        let fetcher = |url: &str| -> Result<FetchedPayload, FetchError> {
            Ok(FetchedPayload::ok(url.as_bytes().to_vec()))
        };
        let payload = fetcher.fetch("https://example.com/t").unwrap();
        assert!(payload.is_success());
        assert_eq!(payload.body, b"https://example.com/t");
    }

    #[test]
    fn test_status_classification() {
        assert!(FetchedPayload::new(204, Vec::new()).is_success());
        assert!(!FetchedPayload::new(403, Vec::new()).is_success());
        assert!(!FetchedPayload::new(500, Vec::new()).is_success());
    }

    #[test]
    fn test_fetch_config_builder() {
        let config = FetchConfig::new()
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("guard-test");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "guard-test");
        assert!(HttpFetcher::new(&config).is_ok());
    }
}
