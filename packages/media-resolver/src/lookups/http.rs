//! HTTP media lookup.
//!
//! Talks to a JSON endpoint of the form `GET {base}/tweets/{id}/media`
//! answering with an array of [`ApiMediaRecord`]s.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{LookupError, LookupResult};
use crate::pipeline::context::is_tweet_id;
use crate::security::LookupToken;
use crate::traits::lookup::{ApiMediaRecord, MediaLookup};

/// Media lookup over HTTP.
///
/// # Example
///
/// ```rust,ignore
/// let lookup = HttpMediaLookup::new("https://media-lookup.internal/api")?
///     .with_token(std::env::var("MEDIA_LOOKUP_TOKEN")?);
/// let records = lookup.tweet_media("1790000000000000000").await?;
/// ```
pub struct HttpMediaLookup {
    client: reqwest::Client,
    base_url: Url,
    token: Option<LookupToken>,
    request_timeout: Duration,
}

impl HttpMediaLookup {
    /// Create a lookup against `base_url`.
    pub fn new(base_url: &str) -> LookupResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| LookupError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(LookupError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("media-resolver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LookupError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            base_url,
            token: None,
            request_timeout: Duration::from_secs(30),
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<LookupToken>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Transport-level timeout per request.
    ///
    /// The resolver enforces its own per-attempt deadline on top of this.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the media endpoint for one post.
    pub fn endpoint(&self, tweet_id: &str) -> LookupResult<Url> {
        if !is_tweet_id(tweet_id) {
            return Err(LookupError::InvalidTweetId(tweet_id.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["tweets", tweet_id, "media"]);
        Ok(url)
    }
}

#[async_trait]
impl MediaLookup for HttpMediaLookup {
    async fn tweet_media(&self, tweet_id: &str) -> LookupResult<Vec<ApiMediaRecord>> {
        let url = self.endpoint(tweet_id)?;
        debug!(url = %url, "Media lookup request");

        let mut request = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .timeout(self.request_timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose());
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Media lookup request failed");
            LookupError::Http(Box::new(e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                tweet_id: tweet_id.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Http(Box::new(e)))?;
        let records: Vec<ApiMediaRecord> = serde_json::from_str(&body)?;

        debug!(tweet_id = %tweet_id, count = records.len(), "Media lookup response");
        Ok(records)
    }

    fn name(&self) -> &str {
        "http"
    }
}
