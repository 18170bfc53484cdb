//! Media Resolution Library
//!
//! Given the element a user clicked inside a social-media post, resolves the
//! full, deduplicated list of media in that post and which item was clicked.
//!
//! # Design
//!
//! - API first: the post id is read off the clicked element and the media
//!   list comes from a lookup service, bounded by timeout and retry
//! - DOM fallback: when the lookup is unavailable, slow, or empty, the post
//!   container is scanned for images, videos, lazy-load attributes and
//!   background images
//! - Deduplication by media key or normalized URL, with the clicked index
//!   carried over to the deduplicated list
//! - `extract` never fails: every problem ends up in the result
//!
//! # Usage
//!
//! ```rust,ignore
//! use media_resolver::{ExtractionOptions, MediaResolver, PageSnapshot};
//! use media_resolver::lookups::HttpMediaLookup;
//!
//! let resolver = MediaResolver::new(HttpMediaLookup::new("https://lookup.example.com")?);
//! let page = PageSnapshot::parse(&html, Some("https://x.com/alice/status/42"))?;
//! let clicked = page.select_first("img[data-tweet-id]")?;
//!
//! let result = resolver.extract(&page, clicked, ExtractionOptions::default()).await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```
//!
//! # Modules
//!
//! - [`dom`] - Page snapshot, element helpers, style resolution
//! - [`media_url`] - URL validity, upgrade and normalization rules
//! - [`pipeline`] - Context resolution, collectors, dedup, the resolver
//! - [`traits`] - The media lookup abstraction
//! - [`lookups`] - Lookup implementations (HTTP, no-op)
//! - [`security`] - Redacted lookup credentials
//! - [`types`] - Descriptors, contexts, results, options
//! - [`testing`] - Mock lookup and post fixtures

pub mod dom;
pub mod error;
pub mod lookups;
pub mod media_url;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use dom::{InlineStyleResolver, PageSnapshot, StyleResolver};
pub use error::{CollectError, DomError, LookupError, ResolveError};
pub use media_url::{IdentityUpgrader, OriginalQualityUpgrader, UrlUpgrader};
pub use pipeline::{MediaResolver, TweetContextResolver};
pub use traits::lookup::{ApiMediaRecord, ApiMediaType, MediaLookup};
pub use types::{
    config::{ExtractionOptions, ResolverConfig},
    context::{TweetContext, UNKNOWN_USERNAME},
    media::{MediaDescriptor, MediaType},
    result::{ErrorCode, ExtractionResult, ResultError, ResultMetadata, SourceType},
};
