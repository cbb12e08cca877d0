//! Capabilities consumed by the caching interceptor.
//!
//! The interceptor never talks to a key-value service or the network
//! directly; it goes through these two traits so backends can be swapped
//! and mocked.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::{AccessKey, Content};

// ═══════════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key-value store with atomic counters and expiring values.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - Redis (`INCR`, `GET`, `SETEX`)
///
/// Every operation must be atomic with respect to concurrent callers; the
/// interceptor relies on that and does no locking of its own.
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically increments the integer at `key`, creating it at 0 first.
    ///
    /// Returns the post-increment value.
    async fn increment(&self, key: &str) -> Result<u64>;

    /// Reads the value at `key`. Missing and expired keys are `None`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Writes `value` at `key`, replacing any previous value and TTL.
    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn increment(&self, key: &str) -> Result<u64> {
        (**self).increment(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        (**self).set_with_ttl(key, value, ttl).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FETCHER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// The expensive retrieval sitting behind the cache.
///
/// A fetcher does not retry. Retries belong to the fetcher's own transport
/// or to the caller of the interceptor.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves the content identified by `key`.
    async fn fetch(&self, key: &AccessKey) -> Result<Content>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, key: &AccessKey) -> Result<Content> {
        (**self).fetch(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchErrorKind, TrackerError};

    struct Echo;

    #[async_trait]
    impl Fetcher for Echo {
        async fn fetch(&self, key: &AccessKey) -> Result<Content> {
            if key.as_str() == "fail" {
                return Err(TrackerError::fetch_failed(key.as_str(), FetchErrorKind::Transport, "refused"));
            }
            Ok(Content::from(key.as_str().to_string()))
        }
    }

    #[tokio::test]
    async fn test_arc_fetcher_delegates() {
        let fetcher: Arc<dyn Fetcher> = Arc::new(Echo);
        let key = AccessKey::new("page").unwrap();
        assert_eq!(fetcher.fetch(&key).await.unwrap().as_str().unwrap(), "page");

        let bad = AccessKey::new("fail").unwrap();
        let err = fetcher.fetch(&bad).await.unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Transport));
    }
}
