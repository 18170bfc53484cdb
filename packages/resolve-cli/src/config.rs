use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Lookup service settings loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct LookupConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

impl LookupConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            url: non_empty("MEDIA_LOOKUP_URL"),
            token: non_empty("MEDIA_LOOKUP_TOKEN"),
            timeout_ms: non_empty("MEDIA_LOOKUP_TIMEOUT_MS")
                .map(|v| v.parse())
                .transpose()
                .context("MEDIA_LOOKUP_TIMEOUT_MS must be a valid number")?,
            max_retries: non_empty("MEDIA_LOOKUP_MAX_RETRIES")
                .map(|v| v.parse())
                .transpose()
                .context("MEDIA_LOOKUP_MAX_RETRIES must be a valid number")?,
        })
    }

    /// Flags win over the environment.
    pub fn merge(self, flags: LookupConfig) -> Self {
        Self {
            url: flags.url.or(self.url),
            token: flags.token.or(self.token),
            timeout_ms: flags.timeout_ms.or(self.timeout_ms),
            max_retries: flags.max_retries.or(self.max_retries),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_environment() {
        let from_env = LookupConfig {
            url: Some("https://env.example.com".to_string()),
            token: Some("env-token".to_string()),
            timeout_ms: Some(2000),
            max_retries: None,
        };
        let flags = LookupConfig {
            url: Some("https://flag.example.com".to_string()),
            max_retries: Some(1),
            ..Default::default()
        };

        let merged = from_env.merge(flags);
        assert_eq!(merged.url.as_deref(), Some("https://flag.example.com"));
        assert_eq!(merged.token.as_deref(), Some("env-token"));
        assert_eq!(merged.timeout_ms, Some(2000));
        assert_eq!(merged.max_retries, Some(1));
    }
}
