//! HTTP client utilities.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::CrawlError;

/// Shared HTTP client with sensible defaults for polite API access.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with default settings and a crate-derived user agent.
    pub fn new() -> Result<Self, CrawlError> {
        Self::from_config(&HttpConfig::default())
    }

    /// Create a client from configuration.
    pub fn from_config(config: &HttpConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| CrawlError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Start a GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// The underlying reqwest client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_builds() {
        assert!(HttpClient::new().is_ok());
    }
}
