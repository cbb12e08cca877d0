//! # PAGETRACK Store
//!
//! Key-value backends implementing [`pagetrack_core::Store`].
//!
//! - **Memory**: in-process store with TTL expiry for development, tests and
//!   single-process deployments
//! - **Redis** (feature `redis`): the remote store, driven with `INCR`, `GET`
//!   and `SETEX`
//!
//! ## Example
//!
//! ```rust,ignore
//! use pagetrack_store::MemoryStore;
//! use pagetrack_core::Store;
//!
//! let store = MemoryStore::new();
//! store.increment("count:http://example.com").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::{MemoryStore, MemoryStoreConfig, StoreStats};
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

// Re-export the trait from core
pub use pagetrack_core::traits::Store;
