//! Resolution pipeline.
//!
//! The pipeline runs:
//! - Tweet context resolution from the clicked element
//! - Lookup record mapping and clicked-media matching (api-first path)
//! - Source collection over the post container (dom-fallback path)
//! - Deduplication with clicked-index remapping (both paths)

pub mod api;
pub mod collect;
pub mod context;
pub mod dedup;
pub mod resolver;

pub use api::{clicked_record_index, descriptors_from_records, find_media_element};
pub use collect::{collect_all, CollectEnv, Collected, Collector, COLLECTORS};
pub use context::{is_tweet_id, is_valid_username, TweetContextResolver, TweetIdMatch};
pub use dedup::{dedupe, dedupe_key, dedupe_with_index, resolve_clicked_index, Deduped};
pub use resolver::MediaResolver;
