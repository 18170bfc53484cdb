//! Deduplication and clicked-index remapping.
//!
//! Items are compared by a derived key: a media key from metadata when one
//! is present, else the normalized source URL. Items without a key are
//! always kept. Because dropping an earlier duplicate shifts every later
//! position, the clicked index is re-resolved against the deduplicated list
//! by key, then URL, then id, rather than recomputed positionally.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use crate::media_url::normalize_url_for_dedupe;
use crate::types::media::MediaDescriptor;

/// Metadata fields that may hold a media key.
const MEDIA_KEY_FIELDS: &[&str] = &["media_key", "mediaKey"];

/// Nested record that may carry a media key of its own.
const API_DATA_FIELD: &str = "apiData";

/// Output of a dedupe pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deduped {
    pub items: Vec<MediaDescriptor>,

    /// How many items were dropped as duplicates
    pub removed: usize,
}

/// Compute the dedupe key of an item, or `None` when it has neither a media
/// key nor a usable URL.
pub fn dedupe_key(item: &MediaDescriptor) -> Option<String> {
    if let Some(key) = media_key(&item.metadata) {
        return Some(format!("media-key:{}", key));
    }
    url_key(item)
}

fn url_key(item: &MediaDescriptor) -> Option<String> {
    normalize_url_for_dedupe(item.source_url()).map(|url| format!("url:{}", url))
}

fn media_key(metadata: &Map<String, Value>) -> Option<String> {
    let nested = metadata.get(API_DATA_FIELD).and_then(Value::as_object);

    std::iter::once(metadata)
        .chain(nested)
        .flat_map(|map| MEDIA_KEY_FIELDS.iter().filter_map(move |field| map.get(*field)))
        .filter_map(Value::as_str)
        .map(|value| value.trim().to_lowercase())
        .find(|value| !value.is_empty())
}

/// Drop later items whose key was already seen. Order is preserved.
pub fn dedupe(items: Vec<MediaDescriptor>) -> Deduped {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    let mut removed = 0;

    for item in items {
        let duplicate = dedupe_key(&item).is_some_and(|key| !seen.insert(key));
        if duplicate {
            removed += 1;
        } else {
            kept.push(item);
        }
    }

    Deduped { items: kept, removed }
}

/// Find where the item at `tentative` in `original` ended up in `deduped`.
///
/// Tries the item's dedupe key, then its normalized URL, then its id, and
/// finally clamps the tentative index into range. Always returns a valid
/// index for a non-empty `deduped`, and 0 for an empty one.
pub fn resolve_clicked_index(
    tentative: usize,
    original: &[MediaDescriptor],
    deduped: &[MediaDescriptor],
) -> usize {
    if deduped.is_empty() {
        return 0;
    }
    let clamp = |index: usize| index.min(deduped.len() - 1);
    if original.is_empty() {
        return clamp(tentative);
    }

    let start = tentative.min(original.len() - 1);
    let clicked = &original[start];

    let by_key = dedupe_key(clicked)
        .and_then(|key| deduped.iter().position(|item| dedupe_key(item).as_deref() == Some(key.as_str())));
    if let Some(index) = by_key {
        return index;
    }

    let by_url = url_key(clicked)
        .and_then(|key| deduped.iter().position(|item| url_key(item).as_deref() == Some(key.as_str())));
    if let Some(index) = by_url {
        return index;
    }

    if let Some(index) = deduped.iter().position(|item| item.id == clicked.id) {
        return index;
    }

    debug!(tentative, "Clicked item not found after dedupe, clamping");
    clamp(start)
}

/// Dedupe `items` and carry `tentative` over to the deduplicated list.
pub fn dedupe_with_index(items: Vec<MediaDescriptor>, tentative: usize) -> (Deduped, usize) {
    let deduped = dedupe(items.clone());
    let index = resolve_clicked_index(tentative, &items, &deduped.items);

    if deduped.removed > 0 {
        debug!(
            removed = deduped.removed,
            kept = deduped.items.len(),
            tentative,
            resolved = index,
            "Removed duplicate media"
        );
    }

    (deduped, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::media::MediaType;
    use proptest::prelude::*;
    use serde_json::json;

    fn image(id: &str, url: &str) -> MediaDescriptor {
        MediaDescriptor::new(id, url, MediaType::Image)
    }

    #[test]
    fn test_key_prefers_media_key() {
        let item = image("a", "https://pbs.twimg.com/media/A.jpg").with_metadata("mediaKey", "  3_ABC ");
        assert_eq!(dedupe_key(&item).as_deref(), Some("media-key:3_abc"));

        let nested = image("b", "https://pbs.twimg.com/media/B.jpg")
            .with_metadata("apiData", json!({ "media_key": "3_XYZ" }));
        assert_eq!(dedupe_key(&nested).as_deref(), Some("media-key:3_xyz"));
    }

    #[test]
    fn test_key_uses_original_url() {
        let item = image("a", "https://pbs.twimg.com/media/A.jpg?name=orig")
            .with_original_url("https://PBS.twimg.com/media/A.jpg?name=small");
        assert_eq!(dedupe_key(&item).as_deref(), Some("url:https://pbs.twimg.com/media/a.jpg"));
    }

    #[test]
    fn test_blank_url_has_no_key() {
        let item = image("a", "   ");
        assert_eq!(dedupe_key(&item), None);

        // Keyless items are never duplicates of each other
        let deduped = dedupe(vec![image("a", " "), image("b", " ")]);
        assert_eq!(deduped.items.len(), 2);
        assert_eq!(deduped.removed, 0);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let items = vec![
            image("img_0", "https://pbs.twimg.com/media/A.jpg?name=small"),
            image("img_1", "https://pbs.twimg.com/media/B.jpg"),
            image("bg_0", "https://pbs.twimg.com/media/A.jpg?name=large"),
        ];

        let deduped = dedupe(items);
        let ids: Vec<&str> = deduped.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["img_0", "img_1"]);
        assert_eq!(deduped.removed, 1);
    }

    #[test]
    fn test_remap_follows_shared_key() {
        // Clicked the later duplicate; it maps back onto the kept first copy
        let items = vec![
            image("img_0", "https://pbs.twimg.com/media/X.jpg"),
            image("img_1", "https://pbs.twimg.com/media/A.jpg"),
            image("bg_0", "https://pbs.twimg.com/media/X.jpg?name=orig"),
        ];

        let (deduped, index) = dedupe_with_index(items, 2);
        assert_eq!(deduped.items.len(), 2);
        assert_eq!(index, 0);
    }

    #[test]
    fn test_remap_shifts_past_removed_item() {
        let items = vec![
            image("a", "https://pbs.twimg.com/media/A.jpg"),
            image("a_dup", "https://pbs.twimg.com/media/A.jpg"),
            image("c", "https://pbs.twimg.com/media/C.jpg"),
        ];

        let (deduped, index) = dedupe_with_index(items, 2);
        assert_eq!(deduped.items[index].id, "c");
        assert_eq!(index, 1);
    }

    #[test]
    fn test_remap_falls_back_to_id_then_clamp() {
        let original = vec![image("x", " "), image("y", " ")];
        let deduped = vec![image("y", " ")];
        assert_eq!(resolve_clicked_index(1, &original, &deduped), 0);

        let deduped = vec![image("p", " "), image("q", " ")];
        assert_eq!(resolve_clicked_index(9, &original, &deduped), 1);
    }

    #[test]
    fn test_remap_empty() {
        assert_eq!(resolve_clicked_index(3, &[], &[]), 0);
        let (deduped, index) = dedupe_with_index(Vec::new(), 5);
        assert!(deduped.items.is_empty());
        assert_eq!(index, 0);
    }

    fn arb_item() -> impl Strategy<Value = MediaDescriptor> {
        (0usize..6, 0usize..4, proptest::option::of(0usize..3)).prop_map(|(n, q, key)| {
            let url = format!("https://pbs.twimg.com/media/M{}.jpg?q={}", n, q);
            let item = image(&format!("id_{}_{}", n, q), &url);
            match key {
                Some(k) => item.with_metadata("media_key", format!("3_{}", k)),
                None => item,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_no_duplicate_keys(items in proptest::collection::vec(arb_item(), 0..12)) {
            let deduped = dedupe(items.clone());
            let keys: Vec<String> = deduped.items.iter().filter_map(dedupe_key).collect();
            let unique: HashSet<&String> = keys.iter().collect();

            prop_assert_eq!(keys.len(), unique.len());
            prop_assert_eq!(deduped.items.len() + deduped.removed, items.len());
        }

        #[test]
        fn prop_index_always_valid(
            items in proptest::collection::vec(arb_item(), 0..12),
            tentative in 0usize..20,
        ) {
            let (deduped, index) = dedupe_with_index(items, tentative);
            if deduped.items.is_empty() {
                prop_assert_eq!(index, 0);
            } else {
                prop_assert!(index < deduped.items.len());
            }
        }

        #[test]
        fn prop_clicked_key_survives(
            items in proptest::collection::vec(arb_item(), 1..12),
            tentative in 0usize..12,
        ) {
            let clicked_key = dedupe_key(&items[tentative.min(items.len() - 1)]);
            let (deduped, index) = dedupe_with_index(items, tentative);
            prop_assert_eq!(dedupe_key(&deduped.items[index]), clicked_key);
        }
    }
}
