//! Mapping of lookup records to descriptors, and locating the clicked item
//! among them.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::dom::{is_same, parent_element, select_within, self_and_ancestors, tag_name};
use crate::media_url::media_filename;
use crate::traits::lookup::ApiMediaRecord;
use crate::types::context::TweetContext;
use crate::types::media::MediaDescriptor;

/// A media descendant further down than this is not "the" clicked media.
const MAX_DESCENDANT_DEPTH: usize = 3;

/// How many ancestors to climb looking for a sibling media element.
const MAX_ANCESTOR_LEVELS: usize = 5;

static MEDIA_ELEMENT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img, video").unwrap());

/// Turn lookup records into descriptors, keeping the service's order.
pub fn descriptors_from_records(records: &[ApiMediaRecord], context: &TweetContext) -> Vec<MediaDescriptor> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let media_type = record.media_type.media_type();
            let api_data = serde_json::to_value(record).unwrap_or_default();

            MediaDescriptor::new(
                format!("{}_api_{}", context.tweet_id, index),
                record.download_url.as_str(),
                media_type,
            )
            .with_original_url(record.download_url.as_str())
            .with_thumbnail_url(record.preview_url.as_str())
            .with_alt(format!("{} {}", media_type.as_str(), index + 1))
            .with_tweet_context(Some(context))
            .with_metadata("apiIndex", index)
            .with_metadata("apiData", api_data)
        })
        .collect()
}

/// Position of the clicked media among `records`.
///
/// Matches the clicked element's URL against the records, then estimates
/// from the media's order among the media elements of `container`, then
/// settles on 0.
pub fn clicked_record_index(
    clicked: ElementRef<'_>,
    container: ElementRef<'_>,
    records: &[ApiMediaRecord],
) -> usize {
    let media = find_media_element(clicked);

    if let Some(index) = media
        .and_then(element_media_url)
        .and_then(|url| match_record(url, records))
    {
        debug!(index, "Clicked media matched a lookup record");
        return index;
    }

    let estimate = media.and_then(|media| dom_order_index(media, container, records.len()));
    debug!(estimate = ?estimate, "Clicked media not matched by URL");
    estimate.unwrap_or(0)
}

/// The `<img>`/`<video>` the click refers to.
///
/// Checks the element itself, its direct media children, its first media
/// descendant when that is close enough, and finally direct media children
/// of its nearest ancestors.
pub fn find_media_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if is_media(element) {
        return Some(element);
    }

    if let Some(child) = direct_media_child(element) {
        return Some(child);
    }

    let near_descendant = element.select(&MEDIA_ELEMENT).next().filter(|media| {
        self_and_ancestors(*media)
            .take(MAX_DESCENDANT_DEPTH)
            .any(|level| is_same(level, element))
    });
    if near_descendant.is_some() {
        return near_descendant;
    }

    std::iter::successors(parent_element(element), |current| parent_element(*current))
        .take(MAX_ANCESTOR_LEVELS)
        .find_map(direct_media_child)
}

/// URL shown by a media element: `src` for images, `poster` then `src` for videos.
pub fn element_media_url<'a>(element: ElementRef<'a>) -> Option<&'a str> {
    let value = element.value();
    let url = match tag_name(&element) {
        "img" => value.attr("src"),
        "video" => value
            .attr("poster")
            .filter(|p| !p.is_empty())
            .or_else(|| value.attr("src")),
        _ => None,
    };
    url.filter(|u| !u.trim().is_empty())
}

/// Exact URL match against download or preview URL, then by file name.
pub fn match_record(url: &str, records: &[ApiMediaRecord]) -> Option<usize> {
    if let Some(index) = records
        .iter()
        .position(|r| r.download_url == url || r.preview_url == url)
    {
        return Some(index);
    }

    let clicked = media_filename(url)?;
    records
        .iter()
        .position(|r| media_filename(&r.download_url).is_some_and(|name| same_file(&name, &clicked)))
}

/// File names match with or without extension (`ABC` vs `ABC.jpg`).
fn same_file(a: &str, b: &str) -> bool {
    let stem = |name: &str| name.split('.').next().unwrap_or(name).to_string();
    a == b || stem(a) == stem(b)
}

fn dom_order_index(media: ElementRef<'_>, container: ElementRef<'_>, record_count: usize) -> Option<usize> {
    select_within(container, &MEDIA_ELEMENT)
        .position(|candidate| is_same(candidate, media))
        .filter(|index| *index < record_count)
}

fn is_media(element: ElementRef<'_>) -> bool {
    matches!(tag_name(&element), "img" | "video")
}

fn direct_media_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap).find(|child| is_media(*child))
}
