//! Typed errors for the media resolver.
//!
//! Uses `thiserror` for library errors (not `anyhow`). None of these ever
//! leave [`MediaResolver::extract`](crate::MediaResolver::extract): they are
//! either logged and skipped, used to switch paths, or folded into
//! [`ResultError`](crate::types::result::ResultError) entries.

use thiserror::Error;

/// Errors returned by a [`MediaLookup`](crate::traits::lookup::MediaLookup) client.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The lookup service answered with a non-success status
    #[error("lookup returned HTTP {status} for tweet {tweet_id}")]
    Status { status: u16, tweet_id: String },

    /// Response body could not be decoded
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Tweet id rejected before any request was made
    #[error("invalid tweet id: {0}")]
    InvalidTweetId(String),

    /// Base URL cannot carry the lookup path
    #[error("invalid lookup base URL: {0}")]
    InvalidBaseUrl(String),

    /// Service refused or is otherwise unavailable
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// Why the api-first path gave up and handed over to the DOM path.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No strategy produced a tweet id
    #[error("no tweet id could be resolved from the clicked element")]
    NoTweetId,

    /// Every attempt ran past its deadline
    #[error("media lookup timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The lookup client failed
    #[error("media lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// The lookup succeeded but listed no media
    #[error("media lookup returned no media for tweet {tweet_id}")]
    EmptyResponse { tweet_id: String },
}

/// Per-element rejection inside a source collector.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    /// The element carries no usable URL attribute
    #[error("element has no media source")]
    MissingSource,

    /// URL is not absolute http(s) or protocol-relative
    #[error("invalid media URL: {url}")]
    InvalidUrl { url: String },

    /// Avatars are never post media
    #[error("profile image skipped: {url}")]
    ProfileImage { url: String },

    /// Emoji glyph rendered as an image
    #[error("emoji image skipped: {url}")]
    Emoji { url: String },
}

/// Errors raised while building or querying a DOM snapshot.
#[derive(Debug, Error)]
pub enum DomError {
    /// CSS selector failed to parse
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Page location is not a valid URL
    #[error("invalid page location: {0}")]
    InvalidLocation(#[from] url::ParseError),
}

/// Result type alias for lookup operations.
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Result type alias for DOM snapshot operations.
pub type DomResult<T> = std::result::Result<T, DomError>;
