//! The terminal artifact of an extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::MediaDescriptor;

/// Which path produced the media list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    ApiFirst,
    DomFallback,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::ApiFirst => "api-first",
            SourceType::DomFallback => "dom-fallback",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The caller passed no clicked element
    InvalidInput,
    /// Both paths ran and found nothing
    NoMediaFound,
}

/// A failure reported inside a result instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultError {
    pub code: ErrorCode,
    pub message: String,
}

impl ResultError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Diagnostics attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub extracted_at: DateTime<Utc>,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResultError>,
}

/// Deduplicated media of one post plus the position of the clicked item.
///
/// `clicked_index` is within `0..media_items.len()` when the list is
/// non-empty and `0` otherwise. `success` is exactly "the list is non-empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub success: bool,
    pub media_items: Vec<MediaDescriptor>,
    pub clicked_index: usize,
    pub metadata: ResultMetadata,
}

impl ExtractionResult {
    /// Build a result from a finished media list.
    ///
    /// The clicked index is clamped into range, so callers cannot produce a
    /// result that violates the index invariant.
    pub fn from_items(
        media_items: Vec<MediaDescriptor>,
        clicked_index: usize,
        source_type: SourceType,
    ) -> Self {
        let clicked_index = if media_items.is_empty() {
            0
        } else {
            clicked_index.min(media_items.len() - 1)
        };

        Self {
            success: !media_items.is_empty(),
            media_items,
            clicked_index,
            metadata: ResultMetadata {
                extracted_at: Utc::now(),
                source_type,
                errors: Vec::new(),
            },
        }
    }

    /// Build an empty, unsuccessful result carrying one error.
    pub fn empty(source_type: SourceType, error: ResultError) -> Self {
        let mut result = Self::from_items(Vec::new(), 0, source_type);
        result.metadata.errors.push(error);
        result
    }

    /// Append an error entry.
    pub fn with_error(mut self, error: ResultError) -> Self {
        self.metadata.errors.push(error);
        self
    }

    /// The item the user clicked, if any media was found.
    pub fn clicked_item(&self) -> Option<&MediaDescriptor> {
        self.media_items.get(self.clicked_index)
    }

    pub fn source_type(&self) -> SourceType {
        self.metadata.source_type
    }

    pub fn len(&self) -> usize {
        self.media_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::media::MediaType;

    fn item(id: &str) -> MediaDescriptor {
        MediaDescriptor::new(id, format!("https://a/{}.jpg", id), MediaType::Image)
    }

    #[test]
    fn test_from_items_clamps_index() {
        let result = ExtractionResult::from_items(vec![item("a"), item("b")], 7, SourceType::DomFallback);
        assert!(result.success);
        assert_eq!(result.clicked_index, 1);
        assert_eq!(result.clicked_item().map(|i| i.id.as_str()), Some("b"));
    }

    #[test]
    fn test_empty_result() {
        let result = ExtractionResult::empty(
            SourceType::DomFallback,
            ResultError::new(ErrorCode::NoMediaFound, "nothing here"),
        );
        assert!(!result.success);
        assert_eq!(result.clicked_index, 0);
        assert_eq!(result.metadata.errors.len(), 1);
        assert!(result.clicked_item().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let result = ExtractionResult::from_items(vec![item("a")], 0, SourceType::ApiFirst);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["metadata"]["sourceType"], "api-first");
        assert_eq!(json["clickedIndex"], 0);
        assert!(json["mediaItems"].is_array());
        assert!(json["metadata"].get("errors").is_none());
    }
}
