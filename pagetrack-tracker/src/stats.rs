//! In-process interceptor counters.
//!
//! These are local observations of one interceptor instance. The
//! authoritative per-key access counts live in the store.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) requests: AtomicU64,
    pub(crate) hits: AtomicU64,
    pub(crate) misses: AtomicU64,
    pub(crate) fetch_failures: AtomicU64,
    pub(crate) decode_failures: AtomicU64,
    pub(crate) cancelled: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TrackerStats {
        TrackerStats {
            requests: self.requests.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of interceptor statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    /// Calls to `fetch` and friends
    pub requests: u64,
    /// Requests served from the cache
    pub hits: u64,
    /// Requests that invoked the fetcher
    pub misses: u64,
    /// Fetcher invocations that failed
    pub fetch_failures: u64,
    /// Cached entries that could not be decoded and were refetched
    pub decode_failures: u64,
    /// Requests abandoned by cancellation or deadline
    pub cancelled: u64,
}

impl TrackerStats {
    /// Fraction of resolved lookups served from the cache.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let counters = Counters::default();
        Counters::bump(&counters.requests);
        Counters::bump(&counters.requests);
        Counters::bump(&counters.hits);
        Counters::bump(&counters.misses);

        let stats = counters.snapshot();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.hit_ratio(), 0.5);
    }

    #[test]
    fn test_hit_ratio_empty() {
        assert_eq!(TrackerStats::default().hit_ratio(), 0.0);
    }
}
