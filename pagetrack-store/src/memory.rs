//! In-memory key-value store with TTL expiry.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

use pagetrack_core::error::{Result, TrackerError};
use pagetrack_core::traits::Store;

/// Stored value with optional expiry.
#[derive(Clone)]
struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// Memory store configuration.
#[derive(Clone, Debug)]
pub struct MemoryStoreConfig {
    /// Preallocated number of entries
    pub initial_capacity: usize,
    /// Entry count at which writes first sweep out expired entries
    pub purge_threshold: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            purge_threshold: 10_000,
        }
    }
}

/// In-memory [`Store`].
///
/// Counters are kept as ASCII decimal, the way Redis keeps them, so
/// `get` on a counter key returns e.g. `b"3"`. Expired entries are invisible
/// to reads and are dropped lazily.
///
/// # Thread Safety
///
/// Each operation takes the lock once, so increments and writes are atomic.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    config: MemoryStoreConfig,
}

impl MemoryStore {
    /// Creates a new empty store with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Creates a store with custom configuration.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
            config,
        }
    }

    fn increment_sync(&self, key: &str) -> Result<u64> {
        let now = Instant::now();
        let mut entries = self.entries.write();

        let (current, expires_at) = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => (parse_counter(key, &entry.value)?, entry.expires_at),
            _ => (0, None),
        };

        let next = current.checked_add(1).ok_or_else(|| {
            TrackerError::StoreUnavailable(format!("increment of '{}' would overflow", key))
        })?;

        entries.insert(
            key.to_string(),
            Entry {
                value: Bytes::from(next.to_string()),
                expires_at,
            },
        );
        Ok(next)
    }

    fn get_sync(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
    }

    fn set_sync(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(TrackerError::ValidationError(format!(
                "TTL for '{}' must be greater than zero",
                key
            )));
        }

        let now = Instant::now();
        let mut entries = self.entries.write();

        if entries.len() >= self.config.purge_threshold {
            let before = entries.len();
            entries.retain(|_, e| !e.is_expired(now));
            debug!(purged = before - entries.len(), "Purged expired entries");
        }

        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    /// Returns the remaining lifetime of `key`.
    ///
    /// `None` if the key is missing, expired, or has no TTL.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    /// Removes a key.
    pub fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes all expired entries.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.write().retain(|_, e| !e.is_expired(now));
    }

    /// Returns the number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        let now = Instant::now();
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired(now)).count();
        StoreStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl Store for MemoryStore {
    #[instrument(level = "trace", skip(self))]
    async fn increment(&self, key: &str) -> Result<u64> {
        let value = self.increment_sync(key)?;
        trace!(key, value, "Incremented");
        Ok(value)
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.get_sync(key))
    }

    #[instrument(level = "trace", skip(self, value), fields(len = value.len()))]
    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        self.set_sync(key, value, ttl)
    }
}

/// Store statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries not yet purged
    pub expired_entries: usize,
    /// Live entries
    pub valid_entries: usize,
}

fn parse_counter(key: &str, value: &[u8]) -> Result<u64> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| {
            TrackerError::StoreUnavailable(format!("value at '{}' is not an integer", key))
        })
}
