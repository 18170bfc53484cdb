//! DOM source collectors.
//!
//! Four scanners run over a post container in a fixed order: `<img>`,
//! `<video>`, lazy-load data attributes, and background images. Each one
//! turns accepted elements into [`MediaDescriptor`]s and reports where the
//! clicked element landed among its candidates. Within one collector the
//! last related candidate wins. A bad element is logged and skipped; it
//! never aborts the scan.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::dom::{contains, elements_within, parse_css_url, select_within, tag_name, StyleResolver};
use crate::error::CollectError;
use crate::media_url::{
    absolutize, detect_media_type, is_emoji_url, is_profile_image_url, is_valid_media_url, UrlUpgrader,
};
use crate::types::context::TweetContext;
use crate::types::media::{MediaDescriptor, MediaType};

/// Lazy-load attributes, highest priority first.
const DATA_URL_ATTRIBUTES: &[&str] = &["data-src", "data-background-image", "data-url"];

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static VIDEO: LazyLock<Selector> = LazyLock::new(|| Selector::parse("video").unwrap());
static DATA_URL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[data-src], [data-background-image], [data-url]").unwrap());

/// Everything a collector needs besides the container.
pub struct CollectEnv<'a> {
    /// The element the user clicked
    pub clicked: ElementRef<'a>,

    /// Post identity to attach to every descriptor, when known
    pub context: Option<&'a TweetContext>,

    pub upgrader: &'a dyn UrlUpgrader,
    pub style: &'a dyn StyleResolver,
}

/// Output of one collector, or of all of them concatenated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    pub items: Vec<MediaDescriptor>,

    /// Position of the clicked element within `items`, if it was seen
    pub clicked_index: Option<usize>,
}

impl Collected {
    /// Append another collector's output.
    ///
    /// The first reporter of a clicked index keeps it; later indexes are
    /// ignored, but their items are still appended.
    pub fn append(&mut self, other: Collected) {
        if self.clicked_index.is_none() {
            self.clicked_index = other.clicked_index.map(|i| i + self.items.len());
        }
        self.items.extend(other.items);
    }
}

/// A source collector.
pub type Collector = fn(ElementRef<'_>, &CollectEnv<'_>) -> Collected;

/// Collectors in the order their output is concatenated.
pub const COLLECTORS: &[(&str, Collector)] = &[
    ("img-element", collect_images),
    ("video-element", collect_videos),
    ("data-attribute", collect_data_attributes),
    ("background-image", collect_background_images),
];

/// Run every collector over `container` and concatenate the results.
pub fn collect_all(container: ElementRef<'_>, env: &CollectEnv<'_>) -> Collected {
    let mut all = Collected::default();

    for (source, collector) in COLLECTORS {
        let collected = collector(container, env);
        debug!(
            source = *source,
            count = collected.items.len(),
            clicked = ?collected.clicked_index,
            "Collector finished"
        );
        all.append(collected);
    }

    all
}

/// `<img>` elements, by `src`.
pub fn collect_images(container: ElementRef<'_>, env: &CollectEnv<'_>) -> Collected {
    scan(
        "img-element",
        select_within(container, &IMG),
        env,
        is_clicked,
        |index, element| {
            let src = attr(element, "src")?;
            let url = accept_image_url(src)?;

            let mut item = build(env, format!("img_{}", index), &url, MediaType::Image, "img-element");
            if let Some(alt) = element.value().attr("alt").filter(|a| !a.trim().is_empty()) {
                item = item.with_alt(alt.trim());
            }
            Ok(item)
        },
    )
}

/// `<video>` elements: `src` when usable, else the poster image.
pub fn collect_videos(container: ElementRef<'_>, env: &CollectEnv<'_>) -> Collected {
    scan(
        "video-element",
        select_within(container, &VIDEO),
        env,
        is_clicked,
        |index, element| {
            let poster = element
                .value()
                .attr("poster")
                .filter(|p| is_valid_media_url(p))
                .map(absolutize);

            let source = match element.value().attr("src").filter(|s| !s.trim().is_empty()) {
                Some(src) if is_valid_media_url(src) => absolutize(src),
                Some(src) if poster.is_none() => return Err(reject(src)),
                _ => poster.clone().ok_or(CollectError::MissingSource)?,
            };

            let mut item = build(env, format!("video_{}", index), &source, MediaType::Video, "video-element");
            if let Some(poster) = poster {
                item = item.with_thumbnail_url(poster);
            }
            Ok(item)
        },
    )
}

/// Elements carrying a lazy-load URL in `data-src`, `data-background-image` or `data-url`.
pub fn collect_data_attributes(container: ElementRef<'_>, env: &CollectEnv<'_>) -> Collected {
    scan(
        "data-attribute",
        select_within(container, &DATA_URL),
        env,
        holds_click,
        |index, element| {
            let value = DATA_URL_ATTRIBUTES
                .iter()
                .filter_map(|name| element.value().attr(name))
                .find(|v| !v.trim().is_empty())
                .ok_or(CollectError::MissingSource)?;
            let url = accept_image_url(value)?;
            let media_type = detect_media_type(&url);

            Ok(build(env, format!("data_{}", index), &url, media_type, "data-attribute"))
        },
    )
}

/// Any element whose background image is a media URL.
pub fn collect_background_images(container: ElementRef<'_>, env: &CollectEnv<'_>) -> Collected {
    let candidates = elements_within(container).filter(|element| {
        env.style
            .background_image(*element)
            .and_then(|value| parse_css_url(&value))
            .is_some()
    });

    scan("background-image", candidates, env, holds_click, |index, element| {
        let url = env
            .style
            .background_image(element)
            .and_then(|value| parse_css_url(&value))
            .ok_or(CollectError::MissingSource)?;
        let url = accept_image_url(&url)?;

        Ok(build(env, format!("bg_{}", index), &url, MediaType::Image, "background-image"))
    })
}

/// Drive one collector: enumerate, convert, skip failures, track the click.
fn scan<'a, I, F>(
    source: &str,
    candidates: I,
    env: &CollectEnv<'_>,
    related: fn(ElementRef<'_>, ElementRef<'_>) -> bool,
    mut convert: F,
) -> Collected
where
    I: Iterator<Item = ElementRef<'a>>,
    F: FnMut(usize, ElementRef<'a>) -> Result<MediaDescriptor, CollectError>,
{
    let mut collected = Collected::default();

    for (index, element) in candidates.enumerate() {
        match convert(index, element) {
            Ok(item) => {
                if related(element, env.clicked) {
                    collected.clicked_index = Some(collected.items.len());
                }
                collected.items.push(item);
            }
            Err(e) => {
                debug!(source = source, element = tag_name(&element), index, error = %e, "Skipping element");
            }
        }
    }

    collected
}

/// The clicked element is the candidate, sits inside it, or wraps it.
fn is_clicked(candidate: ElementRef<'_>, clicked: ElementRef<'_>) -> bool {
    contains(candidate, clicked) || contains(clicked, candidate)
}

/// The clicked element is the candidate or sits inside it.
fn holds_click(candidate: ElementRef<'_>, clicked: ElementRef<'_>) -> bool {
    contains(candidate, clicked)
}

fn attr<'a>(element: ElementRef<'a>, name: &str) -> Result<&'a str, CollectError> {
    element
        .value()
        .attr(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(CollectError::MissingSource)
}

fn accept_image_url(raw: &str) -> Result<String, CollectError> {
    if !is_valid_media_url(raw) {
        return Err(reject(raw));
    }
    if is_emoji_url(&absolutize(raw)) {
        return Err(CollectError::Emoji { url: raw.to_string() });
    }
    Ok(absolutize(raw))
}

fn reject(raw: &str) -> CollectError {
    if is_profile_image_url(raw) {
        CollectError::ProfileImage { url: raw.to_string() }
    } else {
        CollectError::InvalidUrl { url: raw.to_string() }
    }
}

fn build(
    env: &CollectEnv<'_>,
    id: String,
    source_url: &str,
    media_type: MediaType,
    fallback_source: &str,
) -> MediaDescriptor {
    MediaDescriptor::new(id, env.upgrader.upgrade(source_url, media_type), media_type)
        .with_original_url(source_url)
        .with_tweet_context(env.context)
        .with_metadata("fallbackSource", fallback_source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{InlineStyleResolver, PageSnapshot};
    use crate::media_url::{IdentityUpgrader, OriginalQualityUpgrader};

    const POST: &str = r#"
        <article id="post">
          <a href="/alice"><img id="avatar" src="https://pbs.twimg.com/profile_images/1/a_normal.jpg"></a>
          <img id="emoji" src="https://abs-0.twimg.com/emoji/v2/svg/1f600.svg">
          <div id="p1"><img id="a" alt="first" src="https://pbs.twimg.com/media/A?format=jpg&name=small"></div>
          <div id="p2"><img id="b" src="https://pbs.twimg.com/media/B?format=jpg&name=small"></div>
          <img id="broken" src="data:image/gif;base64,R0lGOD">
          <video id="v" poster="https://pbs.twimg.com/ext_tw_video_thumb/1/pu/img/P.jpg" src="blob:https://x.com/abc"></video>
          <div id="lazy" data-src="https://video.twimg.com/ext_tw_video/1/vid/720/V.mp4"></div>
          <div id="bg" style="background-image: url('https://pbs.twimg.com/media/C?format=jpg&name=small')"></div>
        </article>
    "#;

    fn page() -> PageSnapshot {
        PageSnapshot::parse(POST, Some("https://x.com/alice/status/42")).unwrap()
    }

    fn run(page: &PageSnapshot, clicked: &str, collector: Collector) -> Collected {
        let container = page.select_first("#post").unwrap().unwrap();
        let clicked = page.select_first(clicked).unwrap().unwrap();
        let env = CollectEnv {
            clicked,
            context: None,
            upgrader: &OriginalQualityUpgrader,
            style: &InlineStyleResolver,
        };
        collector(container, &env)
    }

    #[test]
    fn test_images_skip_avatars_emoji_and_invalid() {
        let page = page();
        let collected = run(&page, "#b", collect_images);

        assert_eq!(collected.items.len(), 2);
        // Ids follow the enumeration position, so skipped elements leave gaps
        assert_eq!(collected.items[0].id, "img_2");
        assert_eq!(collected.items[1].id, "img_3");
        assert_eq!(collected.clicked_index, Some(1));

        let first = &collected.items[0];
        assert_eq!(first.url, "https://pbs.twimg.com/media/A?format=jpg&name=orig");
        assert_eq!(
            first.original_url.as_deref(),
            Some("https://pbs.twimg.com/media/A?format=jpg&name=small")
        );
        assert_eq!(first.alt.as_deref(), Some("first"));
        assert_eq!(first.metadata["fallbackSource"], "img-element");
    }

    #[test]
    fn test_clicked_wrapper_matches_contained_image() {
        let page = page();
        let collected = run(&page, "#p1", collect_images);
        assert_eq!(collected.clicked_index, Some(0));
    }

    #[test]
    fn test_wrapper_around_several_images_keeps_last() {
        let html = r#"
            <article id="post">
              <div id="grid">
                <img src="https://pbs.twimg.com/media/A?format=jpg&name=small">
                <img src="https://pbs.twimg.com/media/B?format=jpg&name=small">
              </div>
              <img src="https://pbs.twimg.com/media/C?format=jpg&name=small">
            </article>"#;
        let page = PageSnapshot::parse(html, None).unwrap();

        let collected = run(&page, "#grid", collect_images);
        assert_eq!(collected.items.len(), 3);
        assert_eq!(collected.clicked_index, Some(1));

        let collected = run(&page, "#post", collect_images);
        assert_eq!(collected.clicked_index, Some(2));
    }

    #[test]
    fn test_background_only_matches_clicked_or_its_ancestors() {
        let html = r#"
            <article id="post">
              <div id="wrap">
                <div id="bg" style="background-image: url('https://pbs.twimg.com/media/C?format=jpg')">
                  <span id="inner">x</span>
                </div>
              </div>
            </article>"#;
        let page = PageSnapshot::parse(html, None).unwrap();

        assert_eq!(run(&page, "#inner", collect_background_images).clicked_index, Some(0));
        assert_eq!(run(&page, "#bg", collect_background_images).clicked_index, Some(0));
        assert_eq!(run(&page, "#wrap", collect_background_images).clicked_index, None);
    }

    #[test]
    fn test_video_falls_back_to_poster() {
        let page = page();
        let collected = run(&page, "#v", collect_videos);

        assert_eq!(collected.items.len(), 1);
        let video = &collected.items[0];
        assert_eq!(video.id, "video_0");
        assert_eq!(video.media_type, MediaType::Video);
        assert_eq!(video.url, "https://pbs.twimg.com/ext_tw_video_thumb/1/pu/img/P.jpg");
        assert_eq!(video.thumbnail_url.as_deref(), Some(video.url.as_str()));
        assert_eq!(collected.clicked_index, Some(0));
    }

    #[test]
    fn test_data_attribute_detects_video() {
        let page = page();
        let collected = run(&page, "#a", collect_data_attributes);

        assert_eq!(collected.items.len(), 1);
        assert_eq!(collected.items[0].id, "data_0");
        assert_eq!(collected.items[0].media_type, MediaType::Video);
        assert_eq!(collected.clicked_index, None);
    }

    #[test]
    fn test_background_images() {
        let page = page();
        let collected = run(&page, "#bg", collect_background_images);

        assert_eq!(collected.items.len(), 1);
        assert_eq!(collected.items[0].id, "bg_0");
        assert_eq!(collected.items[0].url, "https://pbs.twimg.com/media/C?format=jpg&name=orig");
        assert_eq!(collected.items[0].metadata["fallbackSource"], "background-image");
        assert_eq!(collected.clicked_index, Some(0));
    }

    #[test]
    fn test_collect_all_first_reporter_wins() {
        let page = page();
        let container = page.select_first("#post").unwrap().unwrap();
        // Clicking the article: the image collector reports its last image,
        // and that report outranks the video collector's
        let env = CollectEnv {
            clicked: container,
            context: None,
            upgrader: &IdentityUpgrader,
            style: &InlineStyleResolver,
        };

        let all = collect_all(container, &env);
        let ids: Vec<&str> = all.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["img_2", "img_3", "video_0", "data_0", "bg_0"]);
        assert_eq!(all.clicked_index, Some(1));
    }

    #[test]
    fn test_append_offsets_later_index() {
        let mut all = Collected {
            items: vec![MediaDescriptor::new("img_0", "https://a/1.jpg", MediaType::Image)],
            clicked_index: None,
        };
        all.append(Collected {
            items: vec![
                MediaDescriptor::new("bg_0", "https://a/2.jpg", MediaType::Image),
                MediaDescriptor::new("bg_1", "https://a/3.jpg", MediaType::Image),
            ],
            clicked_index: Some(1),
        });
        assert_eq!(all.clicked_index, Some(2));
        assert_eq!(all.items.len(), 3);
    }

    #[test]
    fn test_context_is_attached() {
        let page = page();
        let container = page.select_first("#post").unwrap().unwrap();
        let clicked = page.select_first("#a").unwrap().unwrap();
        let context = TweetContext::new("42", "alice", "https://x.com/alice/status/42", 0.9, "clicked-element-data-attributes");
        let env = CollectEnv {
            clicked,
            context: Some(&context),
            upgrader: &IdentityUpgrader,
            style: &InlineStyleResolver,
        };

        let collected = collect_images(container, &env);
        assert!(collected
            .items
            .iter()
            .all(|item| item.tweet_id.as_deref() == Some("42") && item.tweet_username.as_deref() == Some("alice")));
    }
}
