//! Defaults shared across PAGETRACK crates.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Default lifetime of a cached page, in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 10;

/// Default lifetime of a cached page.
pub const DEFAULT_TTL: Duration = Duration::from_secs(DEFAULT_TTL_SECONDS);

// ═══════════════════════════════════════════════════════════════════════════════
// KEY NAMESPACES
// ═══════════════════════════════════════════════════════════════════════════════
// Every access key maps to two store keys. The prefixes must never overlap,
// otherwise a counter and a cached page could land on the same store key.

/// Prefix of the access counter key (`count:<url>`).
pub const DEFAULT_COUNT_PREFIX: &str = "count:";

/// Prefix of the cached content key (`cached:<url>`).
pub const DEFAULT_CONTENT_PREFIX: &str = "cached:";

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════════════════════════

/// Default request timeout for the HTTP fetcher, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 30;

/// User agent sent by the HTTP fetcher.
pub const DEFAULT_USER_AGENT: &str = concat!("pagetrack/", env!("CARGO_PKG_VERSION"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl_matches_seconds() {
        assert_eq!(DEFAULT_TTL.as_secs(), DEFAULT_TTL_SECONDS);
    }

    #[test]
    fn test_default_prefixes_do_not_overlap() {
        assert!(!DEFAULT_COUNT_PREFIX.starts_with(DEFAULT_CONTENT_PREFIX));
        assert!(!DEFAULT_CONTENT_PREFIX.starts_with(DEFAULT_COUNT_PREFIX));
    }
}
