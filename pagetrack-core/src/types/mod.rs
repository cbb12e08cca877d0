//! Domain types for PAGETRACK.
//!
//! - [`AccessKey`]: identifier of a cacheable resource (a URL)
//! - [`KeySpace`]: derivation of the counter and content store keys
//! - [`Content`]: fetched or cached page body

mod content;
mod key;

pub use content::*;
pub use key::*;
