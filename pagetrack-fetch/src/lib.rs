//! HTTP fetcher for PAGETRACK.
//!
//! One GET per call, with configurable timeout and strict or lenient
//! handling of non-success status codes.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod http;

pub use http::{FetchConfig, HttpFetcher};
