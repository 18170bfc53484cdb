use async_trait::async_trait;
use tracing::warn;

use crate::error::LookupResult;
use crate::traits::lookup::{ApiMediaRecord, MediaLookup};

/// No-op lookup for when no lookup service is configured.
///
/// Always answers with no media, which sends every extraction down the DOM path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMediaLookup;

#[async_trait]
impl MediaLookup for NoopMediaLookup {
    async fn tweet_media(&self, tweet_id: &str) -> LookupResult<Vec<ApiMediaRecord>> {
        warn!(tweet_id = %tweet_id, "NoopMediaLookup: lookup called but no service configured");
        Ok(vec![])
    }

    fn name(&self) -> &str {
        "noop"
    }
}
