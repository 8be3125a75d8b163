//! Gateway configuration

use std::time::Duration;

/// Configuration for connecting to the membership authority
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Authority base URL (e.g. "https://authority.example.com")
    pub base_url: String,

    /// Per-call timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    /// Create a new configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 10,
        }
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub(crate) fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> super::HttpClient {
        super::HttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
