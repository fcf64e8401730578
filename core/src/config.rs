use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for the aggregation backend, supplied by the hosting
/// environment and passed explicitly into the backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let base_url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: trimmed.to_string(),
                reason: "expected an http(s) URL".to_string(),
            });
        }

        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
