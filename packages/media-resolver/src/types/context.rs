//! Tweet context: best-effort post identity for a clicked element.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Username used when no author could be determined.
pub const UNKNOWN_USERNAME: &str = "unknown";

/// Post metadata resolved from the clicked element.
///
/// Created at most once per extraction and only used to enrich media
/// descriptors; it is not part of the returned result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetContext {
    /// Digits-only post id
    pub tweet_id: String,

    /// Author handle, or [`UNKNOWN_USERNAME`]
    pub username: String,

    /// `<origin>/<username>/status/<tweetId>`
    pub tweet_url: String,

    /// Always within `[0, 1]`
    pub confidence: f32,

    /// Tag of the strategy that produced the id; never empty
    pub extraction_method: String,

    /// Diagnostics (element tag, strategy name, ...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl TweetContext {
    /// Create a context. Confidence is clamped into `[0, 1]` and an empty
    /// method tag is replaced with `"unspecified"`.
    pub fn new(
        tweet_id: impl Into<String>,
        username: impl Into<String>,
        tweet_url: impl Into<String>,
        confidence: f32,
        extraction_method: impl Into<String>,
    ) -> Self {
        let extraction_method = extraction_method.into();
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            tweet_id: tweet_id.into(),
            username: username.into(),
            tweet_url: tweet_url.into(),
            confidence,
            extraction_method: if extraction_method.is_empty() {
                "unspecified".to_string()
            } else {
                extraction_method
            },
            metadata: HashMap::new(),
        }
    }

    /// Add a diagnostic entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn has_known_username(&self) -> bool {
        self.username != UNKNOWN_USERNAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(TweetContext::new("1", "a", "u", 1.5, "m").confidence, 1.0);
        assert_eq!(TweetContext::new("1", "a", "u", -0.2, "m").confidence, 0.0);
        assert_eq!(TweetContext::new("1", "a", "u", f32::NAN, "m").confidence, 0.0);
    }

    #[test]
    fn test_extraction_method_never_empty() {
        let context = TweetContext::new("1", "a", "u", 0.9, "");
        assert_eq!(context.extraction_method, "unspecified");
    }

    #[test]
    fn test_unknown_username() {
        let context = TweetContext::new("1", UNKNOWN_USERNAME, "u", 0.9, "m");
        assert!(!context.has_known_username());
    }
}
