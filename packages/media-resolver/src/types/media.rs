//! Media descriptors: one record per extractable asset.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::context::TweetContext;

/// Kind of media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

/// One extractable media asset and the URLs known for it.
///
/// Descriptors are built once by a collector or the API mapper and are
/// never edited afterwards; deduplication only filters lists of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    /// Source-local identifier (`img_0`, `bg_3`, `<tweetId>_api_1`, ...)
    pub id: String,

    /// Resolved display/download URL, after the original-quality upgrade
    pub url: String,

    /// URL as found in the page, before any transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,

    #[serde(rename = "type")]
    pub media_type: MediaType,

    /// Preview image, when the source exposes one (video posters, API previews)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_url: Option<String>,

    /// Open key/value bag; may carry `media_key`, `mediaKey` or `apiData`
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl MediaDescriptor {
    /// Create a descriptor with the required fields only.
    pub fn new(id: impl Into<String>, url: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            original_url: None,
            media_type,
            thumbnail_url: None,
            alt: None,
            tweet_id: None,
            tweet_username: None,
            tweet_url: None,
            metadata: Map::new(),
        }
    }

    /// Set the pre-transform source URL.
    pub fn with_original_url(mut self, url: impl Into<String>) -> Self {
        self.original_url = Some(url.into());
        self
    }

    /// Set the preview URL.
    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Set the alt text.
    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach post identity from a resolved tweet context.
    ///
    /// A `None` context leaves the descriptor unattached.
    pub fn with_tweet_context(mut self, context: Option<&TweetContext>) -> Self {
        if let Some(context) = context {
            self.tweet_id = Some(context.tweet_id.clone());
            self.tweet_username = Some(context.username.clone());
            self.tweet_url = Some(context.tweet_url.clone());
        }
        self
    }

    /// The URL that identifies this asset: `original_url` when known, else `url`.
    pub fn source_url(&self) -> &str {
        self.original_url.as_deref().unwrap_or(&self.url)
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }
}
