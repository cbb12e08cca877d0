//! The caching interceptor.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use pagetrack_core::error::{FetchErrorKind, Result, TrackerError};
use pagetrack_core::traits::{Fetcher, Store};
use pagetrack_core::types::{AccessKey, Content, KeySpace};

use crate::config::TrackerConfig;
use crate::flight::FlightTable;
use crate::stats::{Counters, TrackerStats};

/// Where a fetch was served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from the cache; the fetcher was not called.
    Hit,
    /// The fetcher was called and the cache was refreshed.
    Miss,
}

/// Result of a fetch with its cache metadata.
#[derive(Clone, Debug)]
pub struct FetchOutcome {
    /// The page body
    pub content: Content,
    /// Hit or miss
    pub status: CacheStatus,
    /// Access count for the key after this request was recorded
    pub access_count: u64,
}

/// Counts accesses and caches fetcher results in a [`Store`].
///
/// Every call increments the key's counter before anything else, so the
/// counter records attempts, including ones that later fail or are
/// cancelled. A hit never calls the fetcher; a miss calls it exactly once
/// and writes the result back with the configured TTL. A failed fetch
/// leaves the cache untouched.
///
/// The interceptor keeps no per-request state and can be shared across
/// tasks behind an `Arc`. Without `coalesce_misses`, concurrent misses on
/// the same key each call the fetcher.
pub struct CachingInterceptor<F, S> {
    fetcher: F,
    store: S,
    keys: KeySpace,
    config: TrackerConfig,
    counters: Counters,
    flights: Option<FlightTable>,
}

impl<F: Fetcher, S: Store> CachingInterceptor<F, S> {
    /// Creates an interceptor with default configuration.
    pub fn new(fetcher: F, store: S) -> Self {
        Self::build(fetcher, store, TrackerConfig::default(), KeySpace::default())
    }

    /// Creates an interceptor with custom configuration.
    pub fn with_config(fetcher: F, store: S, config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let keys = config.key_space()?;
        Ok(Self::build(fetcher, store, config, keys))
    }

    fn build(fetcher: F, store: S, config: TrackerConfig, keys: KeySpace) -> Self {
        let flights = config.coalesce_misses.then(FlightTable::default);
        Self {
            fetcher,
            store,
            keys,
            config,
            counters: Counters::default(),
            flights,
        }
    }

    /// Fetches `key`, from the cache when possible.
    pub async fn fetch(&self, key: &AccessKey) -> Result<Content> {
        self.fetch_with_outcome(key).await.map(|outcome| outcome.content)
    }

    /// Fetches `key` and reports whether it was a hit or a miss.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn fetch_with_outcome(&self, key: &AccessKey) -> Result<FetchOutcome> {
        Counters::bump(&self.counters.requests);

        let access_count = self.store.increment(&self.keys.count_key(key)).await?;
        let content_key = self.keys.content_key(key);

        if let Some(content) = self.lookup(key, &content_key).await? {
            Counters::bump(&self.counters.hits);
            debug!(access_count, "Cache hit");
            return Ok(FetchOutcome {
                content,
                status: CacheStatus::Hit,
                access_count,
            });
        }

        let (content, status) = match &self.flights {
            Some(flights) => {
                let _flight = flights.acquire(&content_key).await;
                // another task may have filled the entry while we queued
                match self.lookup(key, &content_key).await? {
                    Some(content) => {
                        Counters::bump(&self.counters.hits);
                        (content, CacheStatus::Hit)
                    }
                    None => (self.fill(key, &content_key).await?, CacheStatus::Miss),
                }
            }
            None => (self.fill(key, &content_key).await?, CacheStatus::Miss),
        };

        debug!(access_count, ?status, len = content.len(), "Resolved");
        Ok(FetchOutcome {
            content,
            status,
            access_count,
        })
    }

    /// Fetches `key`, giving up as soon as `cancel` completes.
    ///
    /// On cancellation the in-flight work is dropped and nothing is cached.
    /// The access already recorded for this call stays recorded.
    pub async fn fetch_until<C>(&self, key: &AccessKey, cancel: C) -> Result<Content>
    where
        C: Future<Output = ()>,
    {
        self.fetch_with_outcome_until(key, cancel)
            .await
            .map(|outcome| outcome.content)
    }

    /// [`fetch_until`](Self::fetch_until) reporting hit or miss and the access count.
    pub async fn fetch_with_outcome_until<C>(&self, key: &AccessKey, cancel: C) -> Result<FetchOutcome>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            result = self.fetch_with_outcome(key) => result,
            _ = cancel => {
                Counters::bump(&self.counters.cancelled);
                debug!(key = %key, "Fetch cancelled");
                Err(TrackerError::Cancelled { key: key.to_string() })
            }
        }
    }

    /// Fetches `key` with a deadline covering store and fetcher round-trips.
    pub async fn fetch_with_timeout(&self, key: &AccessKey, deadline: Duration) -> Result<Content> {
        self.fetch_with_outcome_timeout(key, deadline)
            .await
            .map(|outcome| outcome.content)
    }

    /// [`fetch_with_timeout`](Self::fetch_with_timeout) reporting hit or miss and the access count.
    pub async fn fetch_with_outcome_timeout(
        &self,
        key: &AccessKey,
        deadline: Duration,
    ) -> Result<FetchOutcome> {
        match tokio::time::timeout(deadline, self.fetch_with_outcome(key)).await {
            Ok(result) => result,
            Err(_) => {
                Counters::bump(&self.counters.cancelled);
                warn!(key = %key, ?deadline, "Fetch deadline exceeded");
                Err(TrackerError::DeadlineExceeded {
                    key: key.to_string(),
                    millis: deadline_millis(deadline),
                })
            }
        }
    }

    /// Returns how many times `key` has been requested.
    pub async fn access_count(&self, key: &AccessKey) -> Result<u64> {
        let count_key = self.keys.count_key(key);
        match self.store.get(&count_key).await? {
            None => Ok(0),
            Some(raw) => std::str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| TrackerError::DecodeFailed {
                    key: count_key,
                    reason: "counter is not an integer".into(),
                }),
        }
    }

    /// Returns the live cache entry for `key` without recording an access.
    pub async fn cached(&self, key: &AccessKey) -> Result<Option<Content>> {
        let content_key = self.keys.content_key(key);
        Ok(self.store.get(&content_key).await?.map(Content::from))
    }

    /// Returns a snapshot of this interceptor's statistics.
    pub fn stats(&self) -> TrackerStats {
        self.counters.snapshot()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns the key space used for store keys.
    pub fn key_space(&self) -> &KeySpace {
        &self.keys
    }

    /// Returns the wrapped fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the cache entry. Undecodable entries count as a miss.
    async fn lookup(&self, key: &AccessKey, content_key: &str) -> Result<Option<Content>> {
        match self.store.get(content_key).await {
            Ok(Some(bytes)) => {
                let content = Content::from(bytes);
                if self.config.require_utf8 && !content.is_utf8() {
                    self.decode_failed(key, "cached content is not valid UTF-8");
                    return Ok(None);
                }
                Ok(Some(content))
            }
            Ok(None) => Ok(None),
            Err(TrackerError::DecodeFailed { reason, .. }) => {
                self.decode_failed(key, &reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn decode_failed(&self, key: &AccessKey, reason: &str) {
        Counters::bump(&self.counters.decode_failures);
        warn!(key = %key, reason, "Discarding undecodable cache entry");
    }

    /// Calls the fetcher and caches the result on success.
    async fn fill(&self, key: &AccessKey, content_key: &str) -> Result<Content> {
        Counters::bump(&self.counters.misses);

        let content = match self.fetcher.fetch(key).await {
            Ok(content) => content,
            Err(e) => {
                Counters::bump(&self.counters.fetch_failures);
                warn!(key = %key, error = %e, "Fetch failed, cache left untouched");
                return Err(as_fetch_failure(key, e));
            }
        };

        // never cache what the next lookup would reject
        if self.config.require_utf8 && !content.is_utf8() {
            Counters::bump(&self.counters.fetch_failures);
            warn!(key = %key, len = content.len(), "Fetched content is not valid UTF-8, not caching");
            return Err(TrackerError::fetch_failed(
                key.as_str(),
                FetchErrorKind::Body,
                "content is not valid UTF-8",
            ));
        }

        self.store
            .set_with_ttl(content_key, content.bytes(), self.config.ttl())
            .await?;
        Ok(content)
    }
}

/// Whole milliseconds of `deadline`, saturating at `u64::MAX`.
fn deadline_millis(deadline: Duration) -> u64 {
    u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX)
}

/// Any fetcher error surfaces as a fetch failure.
fn as_fetch_failure(key: &AccessKey, e: TrackerError) -> TrackerError {
    match e {
        TrackerError::FetchFailed { .. } => e,
        other => TrackerError::fetch_failed(key.as_str(), FetchErrorKind::Transport, other),
    }
}

impl<F, S> std::fmt::Debug for CachingInterceptor<F, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingInterceptor")
            .field("config", &self.config)
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}
