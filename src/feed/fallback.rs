//! Primary-then-fallbacks feed loading.
//!
//! Sources are attempted strictly one at a time in priority order. The first
//! source that both fetches and parses wins; nothing is retried or merged.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::config::Config;
use crate::feed::fetcher::{FetchError, Fetcher};
use crate::feed::parser::{parse_feed, ParseError};
use crate::feed::types::{FeedEnvelope, FeedSource};

/// Every configured source failed, or the chain ran out of time.
#[derive(Debug, Error)]
#[error("All feed sources failed ({attempted} attempted, {skipped} skipped by deadline)")]
pub struct AllSourcesFailedError {
    pub attempted: usize,
    /// Sources never tried because the total deadline was spent
    pub skipped: usize,
}

/// A successfully loaded feed and the source it came from.
#[derive(Debug, Clone)]
pub struct LoadedFeed {
    pub envelope: FeedEnvelope,
    pub used_source: FeedSource,
}

impl LoadedFeed {
    pub fn used_fallback(&self) -> bool {
        self.used_source.is_fallback()
    }
}

#[derive(Debug, Error)]
enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub struct FallbackOrchestrator {
    fetcher: Fetcher,
    /// Budget for the whole chain; `None` means each source only has its own timeout
    total_deadline: Option<Duration>,
}

impl FallbackOrchestrator {
    pub fn new(fetcher: Fetcher, total_deadline: Option<Duration>) -> Self {
        Self {
            fetcher,
            total_deadline,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(Fetcher::new(config)?, config.total_deadline()))
    }

    /// Loads the first source that yields a parsed envelope.
    ///
    /// An envelope with zero items is a success. When a total deadline is
    /// set, each attempt is capped to the remaining budget and sources left
    /// once it is spent are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AllSourcesFailedError`] when no source could be loaded.
    pub async fn load(
        &self,
        primary: &FeedSource,
        fallbacks: &[FeedSource],
    ) -> Result<LoadedFeed, AllSourcesFailedError> {
        let started = Instant::now();
        let total = fallbacks.len() + 1;

        for (attempted, source) in std::iter::once(primary).chain(fallbacks).enumerate() {
            let limit = match self.total_deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_sub(started.elapsed());
                    if remaining.is_zero() {
                        tracing::warn!(
                            attempted = attempted,
                            skipped = total - attempted,
                            deadline_secs = deadline.as_secs_f64(),
                            "Feed deadline exhausted, skipping remaining sources"
                        );
                        return Err(AllSourcesFailedError {
                            attempted,
                            skipped: total - attempted,
                        });
                    }
                    remaining
                }
                None => Duration::MAX,
            };

            match self.attempt(source, limit).await {
                Ok(envelope) => {
                    if source.is_fallback() {
                        tracing::info!(
                            url = %source.url,
                            priority = source.priority,
                            "Using fallback feed"
                        );
                    }
                    return Ok(LoadedFeed {
                        envelope,
                        used_source: source.clone(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        url = %source.url,
                        priority = source.priority,
                        error = %e,
                        "Feed source failed, trying next"
                    );
                }
            }
        }

        tracing::error!(attempted = total, "All feed sources failed");
        Err(AllSourcesFailedError {
            attempted: total,
            skipped: 0,
        })
    }

    async fn attempt(&self, source: &FeedSource, limit: Duration) -> Result<FeedEnvelope, SourceError> {
        let doc = self.fetcher.fetch_within(&source.url, limit).await?;
        Ok(parse_feed(&doc)?)
    }
}
