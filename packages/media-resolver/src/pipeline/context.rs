//! Tweet context resolution from a clicked element.
//!
//! Tweet-id strategies run in a fixed priority order and the first hit wins;
//! results are never merged. The author is resolved separately, so a missing
//! username never blocks the id.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::dom::{enclosing_post, self_and_ancestors, tag_name};
use crate::types::config::ResolverConfig;
use crate::types::context::{TweetContext, UNKNOWN_USERNAME};

/// Confidence for ids read directly off the clicked element.
pub const ELEMENT_CONFIDENCE: f32 = 0.9;

/// Confidence for ids read from a status link elsewhere in the post.
pub const CONTAINER_CONFIDENCE: f32 = 0.7;

/// Attributes that may carry the post id, highest priority first.
const TWEET_ID_ATTRIBUTES: &[&str] = &["data-tweet-id", "data-item-id", "data-testid", "data-focusable"];

/// First path segments that are site routes, not accounts.
const RESERVED_ROUTES: &[&str] = &[
    "i", "home", "explore", "notifications", "messages", "bookmarks", "lists", "profile", "more",
    "compose", "search", "settings", "help", "display", "moments", "topics", "login", "logout",
    "signup", "account", "privacy", "tos", "hashtag", "intent", "share",
];

/// Hosts whose absolute links count as profile links, besides the page's own host.
const SITE_HOSTS: &[&str] = &["x.com", "twitter.com"];

static STATUS_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/status/(\d+)").unwrap());
static VIEWER_SUBPATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:photo|video)/\d+/?$").unwrap());
static ARIA_TOKEN_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^id__(\d+)$").unwrap());
static STATUS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([^/]+)/status/(\d+)").unwrap());
static USERNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static STATUS_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/status/"]"#).unwrap());

/// What a strategy gets to look at.
pub struct StrategyInput<'a> {
    pub element: ElementRef<'a>,
    pub location: Option<&'a Url>,
}

/// A tweet-id strategy: a pure function of the clicked element and the page location.
pub type TweetIdStrategy = fn(&StrategyInput<'_>) -> Option<String>;

struct NamedStrategy {
    method: &'static str,
    confidence: f32,
    run: TweetIdStrategy,
}

/// Element-level strategies, in priority order.
const ELEMENT_STRATEGIES: &[NamedStrategy] = &[
    NamedStrategy {
        method: "data-attributes",
        confidence: ELEMENT_CONFIDENCE,
        run: tweet_id_from_data_attributes,
    },
    NamedStrategy {
        method: "aria-labelledby",
        confidence: ELEMENT_CONFIDENCE,
        run: tweet_id_from_aria_labelledby,
    },
    NamedStrategy {
        method: "href-attribute",
        confidence: ELEMENT_CONFIDENCE,
        run: tweet_id_from_href,
    },
];

const CONTAINER_STRATEGY: NamedStrategy = NamedStrategy {
    method: "post-container",
    confidence: CONTAINER_CONFIDENCE,
    run: tweet_id_from_post_container,
};

/// A tweet id and the strategy that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct TweetIdMatch {
    pub tweet_id: String,
    pub method: &'static str,
    pub confidence: f32,
}

/// Resolves post identity for a clicked element.
#[derive(Debug, Clone, Default)]
pub struct TweetContextResolver {
    config: ResolverConfig,
}

impl TweetContextResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the full context, or `None` when no strategy finds a tweet id.
    pub fn resolve(&self, element: ElementRef<'_>, location: Option<&Url>) -> Option<TweetContext> {
        let found = self.resolve_tweet_id(element, location)?;
        let username = self.resolve_username(element, location, &found.tweet_id);
        let tweet_url = format!("{}/{}/status/{}", self.origin(location), username, found.tweet_id);

        debug!(
            tweet_id = %found.tweet_id,
            username = %username,
            method = found.method,
            "Tweet context resolved"
        );

        Some(
            TweetContext::new(
                found.tweet_id,
                username,
                tweet_url,
                found.confidence,
                format!("clicked-element-{}", found.method),
            )
            .with_metadata("element", tag_name(&element))
            .with_metadata("method", found.method),
        )
    }

    /// Run the tweet-id strategies in order and return the first hit.
    pub fn resolve_tweet_id(&self, element: ElementRef<'_>, location: Option<&Url>) -> Option<TweetIdMatch> {
        let input = StrategyInput { element, location };

        let container = self.config.scan_post_container.then_some(&CONTAINER_STRATEGY);
        let found = ELEMENT_STRATEGIES
            .iter()
            .chain(container)
            .find_map(|strategy| {
                (strategy.run)(&input)
                    .filter(|id| is_tweet_id(id))
                    .map(|tweet_id| TweetIdMatch {
                        tweet_id,
                        method: strategy.method,
                        confidence: strategy.confidence,
                    })
            });

        if found.is_none() {
            debug!(element = tag_name(&element), "No tweet id strategy matched");
        }
        found
    }

    /// Resolve the author handle for a known tweet id.
    ///
    /// Looks for a profile link within `username_search_depth` ancestor
    /// levels, then at the page URL (only when it points at the same post),
    /// and finally settles on [`UNKNOWN_USERNAME`].
    pub fn resolve_username(&self, element: ElementRef<'_>, location: Option<&Url>, tweet_id: &str) -> String {
        username_from_ancestors(element, self.config.username_search_depth, location)
            .or_else(|| location.and_then(|url| username_from_location(url, tweet_id)))
            .unwrap_or_else(|| UNKNOWN_USERNAME.to_string())
    }

    fn origin(&self, location: Option<&Url>) -> String {
        location
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|| self.config.default_origin.clone())
    }
}

/// A non-empty, all-digit string.
pub fn is_tweet_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// An account handle that is not a reserved site route.
pub fn is_valid_username(candidate: &str) -> bool {
    USERNAME.is_match(candidate) && !RESERVED_ROUTES.contains(&candidate.to_ascii_lowercase().as_str())
}

/// Tweet id from a URL or path containing `/status/<digits>`.
pub fn tweet_id_from_status_url(url: &str) -> Option<String> {
    STATUS_ID
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

fn tweet_id_from_data_attributes(input: &StrategyInput<'_>) -> Option<String> {
    let element = input.element.value();
    TWEET_ID_ATTRIBUTES
        .iter()
        .filter_map(|name| element.attr(name))
        .find(|value| is_tweet_id(value))
        .map(str::to_string)
}

fn tweet_id_from_aria_labelledby(input: &StrategyInput<'_>) -> Option<String> {
    input
        .element
        .value()
        .attr("aria-labelledby")?
        .split_whitespace()
        .find_map(|token| ARIA_TOKEN_ID.captures(token))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

fn tweet_id_from_href(input: &StrategyInput<'_>) -> Option<String> {
    let href = input.element.value().attr("href")?;
    if let Some(id) = tweet_id_from_status_url(href) {
        return Some(id);
    }

    // Media-viewer paths only make sense relative to the post the page shows
    if VIEWER_SUBPATH.is_match(href) {
        let location = input.location?;
        return STATUS_PATH
            .captures(location.path())
            .and_then(|cap| cap.get(2))
            .map(|m| m.as_str().to_string());
    }

    None
}

fn tweet_id_from_post_container(input: &StrategyInput<'_>) -> Option<String> {
    let container = enclosing_post(input.element)?;
    container
        .select(&STATUS_LINK)
        .filter_map(|link| link.value().attr("href"))
        .find_map(tweet_id_from_status_url)
}

fn username_from_ancestors(element: ElementRef<'_>, depth: usize, location: Option<&Url>) -> Option<String> {
    self_and_ancestors(element).take(depth).find_map(|level| {
        level
            .select(&ANCHOR)
            .filter_map(|anchor| anchor.value().attr("href"))
            .find_map(|href| username_from_href(href, location))
    })
}

/// Username from a profile link: the path must be exactly one non-empty segment.
///
/// Site-relative links always qualify. Absolute links only do when they point
/// at the page's own host or at the site itself.
pub fn username_from_href(href: &str, location: Option<&Url>) -> Option<String> {
    let path = if href.starts_with('/') && !href.starts_with("//") {
        href.split(['?', '#']).next().unwrap_or(href).to_string()
    } else {
        let url = match href.strip_prefix("//") {
            Some(rest) => Url::parse(&format!("https://{}", rest)).ok()?,
            None => Url::parse(href).ok()?,
        };
        if !is_site_host(&url, location) {
            return None;
        }
        url.path().to_string()
    };

    if path.contains("/status/") || path.contains("/photo/") {
        return None;
    }

    let segment = path.strip_prefix('/')?;
    if segment.is_empty() || segment.contains('/') || !is_valid_username(segment) {
        return None;
    }
    Some(segment.to_string())
}

fn is_site_host(url: &Url, location: Option<&Url>) -> bool {
    let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
        return false;
    };
    if location
        .and_then(Url::host_str)
        .is_some_and(|page_host| page_host.eq_ignore_ascii_case(&host))
    {
        return true;
    }

    let bare = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("mobile."))
        .unwrap_or(&host);
    SITE_HOSTS.contains(&bare)
}

fn username_from_location(location: &Url, tweet_id: &str) -> Option<String> {
    let cap = STATUS_PATH.captures(location.path())?;
    let username = cap.get(1)?.as_str();
    let page_tweet_id = cap.get(2)?.as_str();

    (page_tweet_id == tweet_id && is_valid_username(username)).then(|| username.to_string())
}
