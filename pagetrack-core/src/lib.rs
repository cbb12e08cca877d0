//! # PAGETRACK Core
//!
//! Core types, errors, and traits for the PAGETRACK access-counting page cache.
//!
//! This crate provides the building blocks shared by all other PAGETRACK crates:
//!
//! - **Types**: access keys, the count/content key space, fetched content
//! - **Errors**: the fetch / store / decode error taxonomy
//! - **Constants**: default TTL and key prefixes
//! - **Traits**: the [`Store`] and [`Fetcher`] capabilities
//! - **Env**: `PAGETRACK_*` environment configuration helpers
//!
//! ## Example
//!
//! ```rust
//! use pagetrack_core::{AccessKey, KeySpace};
//!
//! let key = AccessKey::new("http://example.com").unwrap();
//! let space = KeySpace::default();
//! assert_eq!(space.count_key(&key), "count:http://example.com");
//! assert_eq!(space.content_key(&key), "cached:http://example.com");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod env;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{FetchErrorKind, Result, TrackerError};
pub use traits::*;
pub use types::*;
