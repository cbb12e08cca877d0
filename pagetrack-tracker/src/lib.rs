//! # PAGETRACK Tracker
//!
//! The caching interceptor: wraps any [`Fetcher`](pagetrack_core::Fetcher),
//! counts every access to a key in a [`Store`](pagetrack_core::Store), and
//! serves repeat accesses from a short-lived cache entry instead of fetching
//! again.
//!
//! ## Flow
//!
//! ```text
//! fetch(key) → INCR count:<key> → GET cached:<key>
//!                                    ├─ hit  → return
//!                                    └─ miss → Fetcher::fetch(key) → SETEX cached:<key> ttl → return
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use pagetrack_tracker::{CachingInterceptor, TrackerConfig};
//!
//! let tracker = CachingInterceptor::with_config(fetcher, store, TrackerConfig::default())?;
//! let page = tracker.fetch(&AccessKey::new("http://example.com")?).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod flight;
mod interceptor;
mod stats;

#[cfg(test)]
mod testing;

pub use config::TrackerConfig;
pub use interceptor::{CacheStatus, CachingInterceptor, FetchOutcome};
pub use stats::TrackerStats;
