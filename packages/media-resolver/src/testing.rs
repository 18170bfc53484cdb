//! Testing utilities including a mock lookup and a post fixture builder.
//!
//! These are useful for exercising the resolver without network calls or
//! hand-written HTML.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{LookupError, LookupResult};
use crate::traits::lookup::{ApiMediaRecord, MediaLookup};

/// A mock media lookup for testing.
///
/// Returns canned records per tweet id. Unknown ids answer with a 404
/// status error.
#[derive(Default)]
pub struct MockMediaLookup {
    /// Predefined records by tweet id
    media: Arc<RwLock<HashMap<String, Vec<ApiMediaRecord>>>>,

    /// Tweet ids that should fail
    fail_ids: Arc<RwLock<Vec<String>>>,

    /// Fail every call
    fail_all: bool,

    /// Fail this many calls before answering normally
    fail_first: Arc<RwLock<usize>>,

    /// Artificial latency per call
    delay: Option<Duration>,

    /// Call tracking
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockMediaLookup {
    /// Create a new mock lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `tweet_id` with `records`.
    pub fn with_media(self, tweet_id: impl Into<String>, records: Vec<ApiMediaRecord>) -> Self {
        self.media.write().unwrap().insert(tweet_id.into(), records);
        self
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Mark a tweet id as failing.
    pub fn fail_tweet(self, tweet_id: impl Into<String>) -> Self {
        self.fail_ids.write().unwrap().push(tweet_id.into());
        self
    }

    /// Fail the first `count` calls, then answer normally.
    pub fn fail_first(self, count: usize) -> Self {
        *self.fail_first.write().unwrap() = count;
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Tweet ids requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Clear all recorded calls.
    pub fn reset_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn should_fail(&self, tweet_id: &str) -> bool {
        if self.fail_all || self.fail_ids.read().unwrap().iter().any(|id| id == tweet_id) {
            return true;
        }

        let mut remaining = self.fail_first.write().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return true;
        }
        false
    }
}

impl Clone for MockMediaLookup {
    fn clone(&self) -> Self {
        Self {
            media: Arc::clone(&self.media),
            fail_ids: Arc::clone(&self.fail_ids),
            fail_all: self.fail_all,
            fail_first: Arc::clone(&self.fail_first),
            delay: self.delay,
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl MediaLookup for MockMediaLookup {
    async fn tweet_media(&self, tweet_id: &str) -> LookupResult<Vec<ApiMediaRecord>> {
        self.calls.write().unwrap().push(tweet_id.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail(tweet_id) {
            return Err(LookupError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Mock connection refused",
            ))));
        }

        self.media
            .read()
            .unwrap()
            .get(tweet_id)
            .cloned()
            .ok_or_else(|| LookupError::Status {
                status: 404,
                tweet_id: tweet_id.to_string(),
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// One media element of a [`PostFixture`].
#[derive(Debug, Clone)]
enum FixtureMedia {
    Image(String),
    Video { poster: String, src: Option<String> },
    Lazy(String),
    Background(String),
}

/// Builder for post markup.
///
/// Every media element gets `id="m<i>"` in insertion order and, when
/// `tagged` is set, a `data-tweet-id` attribute, so tests can click it
/// with `#m<i>`.
///
/// # Example
///
/// ```rust,ignore
/// let html = PostFixture::new("42")
///     .author("alice")
///     .image("https://pbs.twimg.com/media/A?format=jpg&name=small")
///     .background("https://pbs.twimg.com/media/B.jpg")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct PostFixture {
    tweet_id: String,
    author: Option<String>,
    tagged: bool,
    media: Vec<FixtureMedia>,
}

impl PostFixture {
    /// Start a post with the given id.
    pub fn new(tweet_id: impl Into<String>) -> Self {
        Self {
            tweet_id: tweet_id.into(),
            author: None,
            tagged: true,
            media: Vec::new(),
        }
    }

    /// Add a profile link for the author.
    pub fn author(mut self, username: impl Into<String>) -> Self {
        self.author = Some(username.into());
        self
    }

    /// Leave `data-tweet-id` off the media elements.
    pub fn untagged(mut self) -> Self {
        self.tagged = false;
        self
    }

    pub fn image(mut self, src: impl Into<String>) -> Self {
        self.media.push(FixtureMedia::Image(src.into()));
        self
    }

    pub fn video(mut self, poster: impl Into<String>, src: Option<&str>) -> Self {
        self.media.push(FixtureMedia::Video {
            poster: poster.into(),
            src: src.map(str::to_string),
        });
        self
    }

    /// Add an element with a `data-src` lazy-load URL.
    pub fn lazy(mut self, url: impl Into<String>) -> Self {
        self.media.push(FixtureMedia::Lazy(url.into()));
        self
    }

    /// Add an element with an inline background image.
    pub fn background(mut self, url: impl Into<String>) -> Self {
        self.media.push(FixtureMedia::Background(url.into()));
        self
    }

    /// Render the post as a full HTML document.
    pub fn build(&self) -> String {
        let mut body = String::new();

        if let Some(author) = &self.author {
            body.push_str(&format!(r#"<a href="/{0}">{0}</a>"#, author));
        }
        body.push_str(&format!(
            r#"<a href="/{}/status/{}"><time>now</time></a>"#,
            self.author.as_deref().unwrap_or("i/web"),
            self.tweet_id
        ));

        for (i, media) in self.media.iter().enumerate() {
            let tag = if self.tagged {
                format!(r#" data-tweet-id="{}""#, self.tweet_id)
            } else {
                String::new()
            };
            let element = match media {
                FixtureMedia::Image(src) => format!(r#"<img id="m{}"{} src="{}">"#, i, tag, src),
                FixtureMedia::Video { poster, src } => format!(
                    r#"<video id="m{}"{} poster="{}"{}></video>"#,
                    i,
                    tag,
                    poster,
                    src.as_ref().map(|s| format!(r#" src="{}""#, s)).unwrap_or_default()
                ),
                FixtureMedia::Lazy(url) => format!(r#"<div id="m{}"{} data-src="{}"></div>"#, i, tag, url),
                FixtureMedia::Background(url) => format!(
                    r#"<div id="m{}"{} style="background-image: url('{}')"></div>"#,
                    i, tag, url
                ),
            };
            body.push_str(&format!(r#"<div class="media">{}</div>"#, element));
        }

        format!(
            r#"<html><body><main><article data-testid="tweet">{}</article><div id="sidebar"><span id="chrome">Trends</span></div></main></body></html>"#,
            body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::PageSnapshot;

    #[tokio::test]
    async fn test_mock_lookup_answers_and_tracks() {
        let lookup = MockMediaLookup::new()
            .with_media("1", vec![ApiMediaRecord::photo("https://pbs.twimg.com/media/A.jpg", "3_1", 0)]);

        let records = lookup.tweet_media("1").await.unwrap();
        assert_eq!(records.len(), 1);

        let missing = lookup.tweet_media("2").await;
        assert!(matches!(missing, Err(LookupError::Status { status: 404, .. })));

        assert_eq!(lookup.calls(), vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_lookup_failures() {
        let lookup = MockMediaLookup::new()
            .with_media("1", Vec::new())
            .fail_first(2);

        assert!(lookup.tweet_media("1").await.is_err());
        assert!(lookup.tweet_media("1").await.is_err());
        assert!(lookup.tweet_media("1").await.is_ok());

        let always = MockMediaLookup::new().with_media("1", Vec::new()).failing();
        assert!(always.tweet_media("1").await.is_err());

        let one = MockMediaLookup::new().with_media("1", Vec::new()).fail_tweet("1");
        assert!(one.tweet_media("1").await.is_err());
    }

    #[test]
    fn test_fixture_markup() {
        let html = PostFixture::new("42")
            .author("alice")
            .image("https://pbs.twimg.com/media/A.jpg")
            .background("https://pbs.twimg.com/media/B.jpg")
            .build();
        let page = PageSnapshot::parse(&html, None).unwrap();

        let image = page.select_first("#m0").unwrap().unwrap();
        assert_eq!(image.value().attr("data-tweet-id"), Some("42"));
        assert!(page.select_first("#m1[style]").unwrap().is_some());
        assert!(page.select_first(r#"a[href="/alice"]"#).unwrap().is_some());
    }
}
