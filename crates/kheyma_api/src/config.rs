use std::time::Duration;

use crate::error::ApiError;

/// Base URL used when `KHEYMA_API_BASE_URL` is not set
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Settings for the booking backend gateway
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the `/api` context path, without a trailing slash
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    pub timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("kheyma-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// Load the configuration from `KHEYMA_API_BASE_URL` and `KHEYMA_API_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ApiError> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("KHEYMA_API_BASE_URL") {
            config = config.with_base_url(&base_url);
        }

        if let Ok(raw) = std::env::var("KHEYMA_API_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                ApiError::Config(format!("Invalid KHEYMA_API_TIMEOUT_SECS '{}': {}", raw, e))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Replace the base URL, dropping any trailing slash
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Full URL for an endpoint path such as `/auth/login`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
