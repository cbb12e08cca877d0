//! Test doubles for the interceptor tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use pagetrack_core::error::{FetchErrorKind, Result, TrackerError};
use pagetrack_core::traits::{Fetcher, Store};
use pagetrack_core::types::{AccessKey, Content};
use pagetrack_store::MemoryStore;

/// Fetcher returning a settable body (or failing when unset), counting calls.
pub(crate) struct StubFetcher {
    body: Mutex<Option<Content>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub(crate) fn returning(body: impl Into<Content>) -> Self {
        Self {
            body: Mutex::new(Some(body.into())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            body: Mutex::new(None),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn set_body(&self, body: impl Into<Content>) {
        *self.body.lock() = Some(body.into());
    }

    pub(crate) fn set_failing(&self) {
        *self.body.lock() = None;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, key: &AccessKey) -> Result<Content> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let body = self.body.lock().clone();
        body.ok_or_else(|| {
            TrackerError::fetch_failed(key.as_str(), FetchErrorKind::Status(500), "Internal Server Error")
        })
    }
}

/// Fetcher failing with an error that is not a fetch failure.
pub(crate) struct MisbehavingFetcher;

#[async_trait]
impl Fetcher for MisbehavingFetcher {
    async fn fetch(&self, _key: &AccessKey) -> Result<Content> {
        Err(TrackerError::ValidationError("bad upstream payload".into()))
    }
}

/// Store that is never reachable.
pub(crate) struct DownStore;

#[async_trait]
impl Store for DownStore {
    async fn increment(&self, _key: &str) -> Result<u64> {
        Err(TrackerError::StoreUnavailable("connection refused".into()))
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>> {
        Err(TrackerError::StoreUnavailable("connection refused".into()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<()> {
        Err(TrackerError::StoreUnavailable("connection refused".into()))
    }
}

/// Memory store whose next content read reports an undecodable entry.
pub(crate) struct CorruptOnceStore {
    pub(crate) inner: MemoryStore,
    corrupt: Mutex<bool>,
}

impl CorruptOnceStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            corrupt: Mutex::new(true),
        }
    }
}

#[async_trait]
impl Store for CorruptOnceStore {
    async fn increment(&self, key: &str) -> Result<u64> {
        self.inner.increment(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        if key.starts_with("cached:") && std::mem::take(&mut *self.corrupt.lock()) {
            return Err(TrackerError::DecodeFailed {
                key: key.to_string(),
                reason: "unexpected reply".into(),
            });
        }
        self.inner.get(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        self.inner.set_with_ttl(key, value, ttl).await
    }
}

/// Store whose writes fail while reads and increments succeed.
pub(crate) struct ReadOnlyStore {
    pub(crate) inner: MemoryStore,
}

#[async_trait]
impl Store for ReadOnlyStore {
    async fn increment(&self, key: &str) -> Result<u64> {
        self.inner.increment(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.inner.get(key).await
    }

    async fn set_with_ttl(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<()> {
        Err(TrackerError::StoreUnavailable("READONLY replica".into()))
    }
}
