//! Media lookup trait: tweet id in, ordered media records out.
//!
//! The resolver treats the lookup service as a black box. Implementations:
//! - `HttpMediaLookup` - JSON endpoint over HTTP
//! - `MockMediaLookup` - canned records for tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LookupResult;
use crate::types::media::MediaType;

/// Media kind as reported by the lookup service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiMediaType {
    Photo,
    Video,
    AnimatedGif,
}

impl ApiMediaType {
    pub fn media_type(&self) -> MediaType {
        match self {
            ApiMediaType::Photo => MediaType::Image,
            ApiMediaType::Video | ApiMediaType::AnimatedGif => MediaType::Video,
        }
    }
}

/// One media entry of a post, in the order the service lists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMediaRecord {
    /// Full-quality download URL
    pub download_url: String,

    /// Preview/thumbnail URL
    pub preview_url: String,

    /// Stable media key (e.g. `3_1790000000000000000`)
    pub media_key: String,

    #[serde(rename = "type")]
    pub media_type: ApiMediaType,

    /// Ordinal position within the post
    pub index: usize,
}

impl ApiMediaRecord {
    /// Create a photo record whose preview equals its download URL.
    pub fn photo(download_url: impl Into<String>, media_key: impl Into<String>, index: usize) -> Self {
        let download_url = download_url.into();
        Self {
            preview_url: download_url.clone(),
            download_url,
            media_key: media_key.into(),
            media_type: ApiMediaType::Photo,
            index,
        }
    }

    /// Create a video record.
    pub fn video(
        download_url: impl Into<String>,
        preview_url: impl Into<String>,
        media_key: impl Into<String>,
        index: usize,
    ) -> Self {
        Self {
            download_url: download_url.into(),
            preview_url: preview_url.into(),
            media_key: media_key.into(),
            media_type: ApiMediaType::Video,
            index,
        }
    }

    /// Override the preview URL.
    pub fn with_preview_url(mut self, preview_url: impl Into<String>) -> Self {
        self.preview_url = preview_url.into();
        self
    }
}

/// Remote media lookup keyed by numeric post id.
#[async_trait]
pub trait MediaLookup: Send + Sync {
    /// Fetch the ordered media records of a post.
    ///
    /// An empty list is a valid answer; the resolver treats it as "no media
    /// via the API" and falls back to the DOM.
    async fn tweet_media(&self, tweet_id: &str) -> LookupResult<Vec<ApiMediaRecord>>;

    /// Get the lookup name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wire_format() {
        let json = r#"{
            "download_url": "https://video.twimg.com/v.mp4",
            "preview_url": "https://pbs.twimg.com/thumb.jpg",
            "media_key": "7_123",
            "type": "animated_gif",
            "index": 0
        }"#;

        let record: ApiMediaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.media_type, ApiMediaType::AnimatedGif);
        assert_eq!(record.media_type.media_type(), MediaType::Video);
        assert_eq!(record.preview_url, "https://pbs.twimg.com/thumb.jpg");
    }

    #[test]
    fn test_photo_builder() {
        let record = ApiMediaRecord::photo("https://pbs.twimg.com/media/A.jpg", "3_1", 2);
        assert_eq!(record.preview_url, record.download_url);
        assert_eq!(record.media_type.media_type(), MediaType::Image);
        assert_eq!(record.index, 2);
    }
}
