//! Configuration types for resolution and extraction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-call options for the api-first path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionOptions {
    /// Deadline for each lookup attempt, in milliseconds.
    ///
    /// Default: 10000.
    pub timeout_ms: u64,

    /// Extra lookup attempts after the first one fails or times out.
    ///
    /// Retries run immediately, without backoff. Default: 3.
    pub max_retries: u32,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
        }
    }
}

impl ExtractionOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Total attempts, first try included.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Settings for tweet-context resolution, fixed for a resolver's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// How many ancestor levels to climb when looking for the author link.
    ///
    /// Default: 10.
    pub username_search_depth: usize,

    /// Origin used for `tweetUrl` when the page location is unknown or not http(s).
    ///
    /// Default: `https://x.com`.
    pub default_origin: String,

    /// Also read `/status/<id>` links inside the enclosing post container
    /// when the clicked element itself carries no id.
    ///
    /// Off by default: a miss on the element goes straight to the DOM path.
    pub scan_post_container: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            username_search_depth: 10,
            default_origin: "https://x.com".to_string(),
            scan_post_container: false,
        }
    }
}

impl ResolverConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ancestor depth for username resolution.
    pub fn with_username_search_depth(mut self, depth: usize) -> Self {
        self.username_search_depth = depth;
        self
    }

    /// Set the fallback origin.
    pub fn with_default_origin(mut self, origin: impl Into<String>) -> Self {
        self.default_origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable the post-container id strategy.
    pub fn with_post_container_scan(mut self, enabled: bool) -> Self {
        self.scan_post_container = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_defaults() {
        let options = ExtractionOptions::default();
        assert_eq!(options.timeout_ms, 10_000);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.attempts(), 4);
    }

    #[test]
    fn test_option_builder() {
        let options = ExtractionOptions::new().with_timeout_ms(50).with_max_retries(0);
        assert_eq!(options.timeout(), Duration::from_millis(50));
        assert_eq!(options.attempts(), 1);
    }

    #[test]
    fn test_resolver_config_builder() {
        let config = ResolverConfig::new()
            .with_username_search_depth(4)
            .with_default_origin("https://twitter.com/")
            .with_post_container_scan(true);

        assert_eq!(config.username_search_depth, 4);
        assert_eq!(config.default_origin, "https://twitter.com");
        assert!(config.scan_post_container);
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: ExtractionOptions =
            serde_json::from_str(r#"{"timeoutMs": 50, "maxRetries": 1}"#).unwrap();
        assert_eq!(options.timeout_ms, 50);
        assert_eq!(options.max_retries, 1);
    }

    #[test]
    fn test_partial_options_use_defaults() {
        let options: ExtractionOptions = serde_json::from_str(r#"{"timeoutMs": 50}"#).unwrap();
        assert_eq!(options.timeout_ms, 50);
        assert_eq!(options.max_retries, 3);
    }
}
