//! Per-key miss coalescing.
//!
//! Tasks missing on the same key queue on one async mutex; whoever holds it
//! fetches, the rest re-read the cache once they get the lock. A lock entry
//! is dropped from the table when its last holder releases it, including
//! when the holder is cancelled.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub(crate) struct FlightTable {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FlightTable {
    /// Waits for exclusive access to `key`.
    pub(crate) async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        // The clone happens under the shard lock, so `release` can never
        // observe a count of one while another task is about to wait.
        let lock = self.locks.entry(key.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;

        FlightGuard {
            table: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    fn release(&self, key: &str) {
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

pub(crate) struct FlightGuard<'a> {
    table: &'a FlightTable,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        // release the mutex (and its Arc) before checking who is left
        self.guard.take();
        self.table.release(&self.key);
    }
}
