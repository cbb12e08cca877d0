//! Error types for PAGETRACK.
//!
//! This module provides the error hierarchy using `thiserror`.
//! Every failure is returned to the caller as a typed result; nothing is
//! printed and swallowed along the way.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Why a fetch failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// The key could not be turned into a request.
    InvalidLocator,
    /// Connection, DNS, TLS or protocol failure.
    Transport,
    /// The request did not complete in time.
    Timeout,
    /// The upstream answered with a non-success status (strict mode only).
    Status(u16),
    /// The response body could not be read.
    Body,
}

impl FetchErrorKind {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchErrorKind::Transport | FetchErrorKind::Timeout | FetchErrorKind::Body => true,
            FetchErrorKind::Status(code) => *code == 429 || (500..600).contains(code),
            FetchErrorKind::InvalidLocator => false,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::InvalidLocator => f.write_str("invalid locator"),
            FetchErrorKind::Transport => f.write_str("transport error"),
            FetchErrorKind::Timeout => f.write_str("timeout"),
            FetchErrorKind::Status(code) => write!(f, "HTTP {}", code),
            FetchErrorKind::Body => f.write_str("body error"),
        }
    }
}

/// Main error type for all PAGETRACK operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    // ═══════════════════════════════════════════════════════════════════════════
    // STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The key-value store could not be reached, timed out, or rejected the operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // FETCH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The fetcher could not resolve a cache miss.
    #[error("Fetch failed for '{key}' ({kind}): {reason}")]
    FetchFailed {
        /// Access key being fetched
        key: String,
        /// Failure class
        kind: FetchErrorKind,
        /// Underlying error message
        reason: String,
    },

    /// A cached entry could not be interpreted.
    #[error("Cached content for '{key}' could not be decoded: {reason}")]
    DecodeFailed {
        /// Access key of the entry
        key: String,
        /// Underlying error message
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // CANCELLATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// The caller cancelled the fetch before it completed.
    #[error("Fetch cancelled for '{key}'")]
    Cancelled {
        /// Access key being fetched
        key: String,
    },

    /// The caller's deadline elapsed before the fetch completed.
    #[error("Fetch for '{key}' exceeded deadline of {millis}ms")]
    DeadlineExceeded {
        /// Access key being fetched
        key: String,
        /// Deadline in milliseconds
        millis: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The access key is empty or malformed.
    #[error("Invalid access key: {0}")]
    InvalidKey(String),

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TrackerError {
    /// Builds a [`TrackerError::FetchFailed`].
    pub fn fetch_failed(key: impl Into<String>, kind: FetchErrorKind, reason: impl ToString) -> Self {
        TrackerError::FetchFailed {
            key: key.into(),
            kind,
            reason: reason.to_string(),
        }
    }

    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        match self {
            TrackerError::StoreUnavailable(_)
            | TrackerError::Cancelled { .. }
            | TrackerError::DeadlineExceeded { .. } => true,
            TrackerError::FetchFailed { kind, .. } => kind.is_transient(),
            _ => false,
        }
    }

    /// Returns true if the fetcher failed to resolve a miss.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, TrackerError::FetchFailed { .. })
    }

    /// Returns true if the store failed.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, TrackerError::StoreUnavailable(_))
    }

    /// Returns the fetch failure class, if this is a fetch failure.
    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            TrackerError::FetchFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
