//! Client configuration shared by every surface (browser shell, CLI).
//!
//! # Design
//! - Plain data with defaults; the caller decides where values come from
//!   (flags, environment, `window.location`).
//! - Paths are joined onto the base URL without double slashes.

use std::time::Duration;

/// Default API base when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Connection settings for the catalog API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://host/api`.
    pub base_url: String,
    /// Bound on a single network attempt.
    pub timeout: Duration,
    /// Page size sent with list requests.
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Configuration for `base_url` with default timeout and page size.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the list page size; zero is clamped to one.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let config = ClientConfig::new("http://host/api/");
        assert_eq!(config.endpoint("/items/"), "http://host/api/items/");
        assert_eq!(config.endpoint("auth/me/"), "http://host/api/auth/me/");
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.page_size, 20);
        assert_eq!(config.with_page_size(0).page_size, 1);
    }
}
