//! The MediaResolver - public entry point of the library.
//!
//! `extract` tries the lookup service first and falls back to scanning the
//! page. Nothing it does can fail the call: lookup errors and timeouts
//! switch paths, and an empty outcome is reported in the result itself.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::dom::{find_post_container, select_within, tag_name, InlineStyleResolver, PageSnapshot, StyleResolver};
use crate::error::ResolveError;
use crate::media_url::{OriginalQualityUpgrader, UrlUpgrader};
use crate::pipeline::api::{clicked_record_index, descriptors_from_records};
use crate::pipeline::collect::{collect_all, CollectEnv};
use crate::pipeline::context::TweetContextResolver;
use crate::pipeline::dedup::dedupe_with_index;
use crate::traits::lookup::{ApiMediaRecord, MediaLookup};
use crate::types::{
    config::{ExtractionOptions, ResolverConfig},
    context::TweetContext,
    result::{ErrorCode, ExtractionResult, ResultError, SourceType},
};

static MEDIA_ELEMENT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img, video").unwrap());

/// Resolves the media list of a post and which item was clicked.
///
/// Holds no per-call state; concurrent calls on different elements are
/// independent.
///
/// # Example
///
/// ```rust,ignore
/// let resolver = MediaResolver::new(HttpMediaLookup::new(base_url)?);
/// let page = PageSnapshot::parse(&html, Some("https://x.com/alice/status/42"))?;
/// let clicked = page.select_first("img")?;
///
/// let result = resolver.extract(&page, clicked, ExtractionOptions::default()).await;
/// println!("{} items, clicked #{}", result.len(), result.clicked_index);
/// ```
pub struct MediaResolver<L: MediaLookup> {
    lookup: L,
    context: TweetContextResolver,
    upgrader: Box<dyn UrlUpgrader>,
    style: Box<dyn StyleResolver>,
}

impl<L: MediaLookup> MediaResolver<L> {
    /// Create a resolver with the default config, original-quality URL
    /// upgrades, and inline-style background detection.
    pub fn new(lookup: L) -> Self {
        Self::with_config(lookup, ResolverConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(lookup: L, config: ResolverConfig) -> Self {
        Self {
            lookup,
            context: TweetContextResolver::new(config),
            upgrader: Box::new(OriginalQualityUpgrader),
            style: Box::new(InlineStyleResolver),
        }
    }

    /// Replace the URL upgrader.
    pub fn with_upgrader(mut self, upgrader: impl UrlUpgrader + 'static) -> Self {
        self.upgrader = Box::new(upgrader);
        self
    }

    /// Replace the background-image source.
    pub fn with_style_resolver(mut self, style: impl StyleResolver + 'static) -> Self {
        self.style = Box::new(style);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        self.context.config()
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Resolve the media of the post around `clicked`.
    ///
    /// A missing element yields an empty, unsuccessful result without
    /// touching the page.
    pub async fn extract(
        &self,
        page: &PageSnapshot,
        clicked: Option<ElementRef<'_>>,
        options: ExtractionOptions,
    ) -> ExtractionResult {
        let Some(clicked) = clicked else {
            warn!("Extraction requested without a clicked element");
            return ExtractionResult::empty(
                SourceType::DomFallback,
                ResultError::new(ErrorCode::InvalidInput, "clicked element is missing"),
            );
        };

        let container = find_post_container(clicked);
        self.extract_in(page, clicked, container, options).await
    }

    /// Resolve with an explicit post container.
    pub async fn extract_in(
        &self,
        page: &PageSnapshot,
        clicked: ElementRef<'_>,
        container: ElementRef<'_>,
        options: ExtractionOptions,
    ) -> ExtractionResult {
        let extraction_id = Uuid::new_v4();
        let span = info_span!("extract", extraction_id = %extraction_id, element = tag_name(&clicked));

        async {
            let started = Instant::now();
            let context = self.context.resolve(clicked, page.location());

            let result = match self.api_first(clicked, container, context.as_ref(), options).await {
                Ok(result) => result,
                Err(reason) => {
                    info!(reason = %reason, "Falling back to DOM scan");
                    self.dom_fallback(clicked, container, context.as_ref())
                }
            };

            info!(
                source = %result.source_type(),
                count = result.len(),
                clicked_index = result.clicked_index,
                success = result.success,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Extraction complete"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Resolve starting from a post container rather than a clicked element.
    ///
    /// The first image or video in the container stands in for the click;
    /// with no media element, the container itself does.
    pub async fn extract_from_container(
        &self,
        page: &PageSnapshot,
        container: ElementRef<'_>,
        options: ExtractionOptions,
    ) -> ExtractionResult {
        let clicked = select_within(container, &MEDIA_ELEMENT)
            .next()
            .unwrap_or(container);
        self.extract_in(page, clicked, container, options).await
    }

    // =========================================================================
    // Paths
    // =========================================================================

    async fn api_first(
        &self,
        clicked: ElementRef<'_>,
        container: ElementRef<'_>,
        context: Option<&TweetContext>,
        options: ExtractionOptions,
    ) -> Result<ExtractionResult, ResolveError> {
        let context = context.ok_or(ResolveError::NoTweetId)?;
        let records = self.lookup_with_retry(&context.tweet_id, options).await?;

        if records.is_empty() {
            return Err(ResolveError::EmptyResponse {
                tweet_id: context.tweet_id.clone(),
            });
        }

        let items = descriptors_from_records(&records, context);
        let tentative = clicked_record_index(clicked, container, &records);
        let (deduped, index) = dedupe_with_index(items, tentative);

        Ok(ExtractionResult::from_items(deduped.items, index, SourceType::ApiFirst))
    }

    /// Call the lookup with a per-attempt deadline, retrying immediately.
    ///
    /// A lookup that misses its deadline is dropped; whatever it would have
    /// returned is never observed.
    async fn lookup_with_retry(
        &self,
        tweet_id: &str,
        options: ExtractionOptions,
    ) -> Result<Vec<ApiMediaRecord>, ResolveError> {
        let attempts = options.attempts();
        let mut last_error = ResolveError::Timeout {
            timeout_ms: options.timeout_ms,
        };

        for attempt in 1..=attempts {
            match timeout(options.timeout(), self.lookup.tweet_media(tweet_id)).await {
                Ok(Ok(records)) => {
                    debug!(
                        lookup = self.lookup.name(),
                        tweet_id = %tweet_id,
                        attempt,
                        count = records.len(),
                        "Lookup succeeded"
                    );
                    return Ok(records);
                }
                Ok(Err(e)) => {
                    warn!(lookup = self.lookup.name(), tweet_id = %tweet_id, attempt, attempts, error = %e, "Lookup failed");
                    last_error = ResolveError::Lookup(e);
                }
                Err(_) => {
                    warn!(
                        lookup = self.lookup.name(),
                        tweet_id = %tweet_id,
                        attempt,
                        attempts,
                        timeout_ms = options.timeout_ms,
                        "Lookup timed out"
                    );
                    last_error = ResolveError::Timeout {
                        timeout_ms: options.timeout_ms,
                    };
                }
            }
        }

        Err(last_error)
    }

    fn dom_fallback(
        &self,
        clicked: ElementRef<'_>,
        container: ElementRef<'_>,
        context: Option<&TweetContext>,
    ) -> ExtractionResult {
        let env = CollectEnv {
            clicked,
            context,
            upgrader: self.upgrader.as_ref(),
            style: self.style.as_ref(),
        };

        let collected = collect_all(container, &env);
        let (deduped, index) = dedupe_with_index(collected.items, collected.clicked_index.unwrap_or(0));
        let result = ExtractionResult::from_items(deduped.items, index, SourceType::DomFallback);

        if result.is_empty() {
            return result.with_error(ResultError::new(
                ErrorCode::NoMediaFound,
                format!("no media found in <{}> post container", tag_name(&container)),
            ));
        }
        result
    }
}
