//! Page content as returned by a fetcher or read back from the store.

use std::borrow::Cow;
use std::fmt;
use std::str::Utf8Error;

use bytes::Bytes;

/// Immutable page body.
///
/// Content is opaque bytes: whatever the fetcher produced is cached and
/// returned verbatim, including empty and whitespace-only bodies.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Content(Bytes);

impl Content {
    /// Wraps a byte buffer.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the underlying buffer (cheap clone).
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Consumes the content, returning the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Interprets the body as UTF-8 text.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    /// Returns true if the body is valid UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.as_str().is_ok()
    }

    /// Decodes the body as UTF-8, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content").field("len", &self.0.len()).finish()
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self(Bytes::from(text))
    }
}

impl From<&'static str> for Content {
    fn from(text: &'static str) -> Self {
        Self(Bytes::from_static(text.as_bytes()))
    }
}

impl From<Content> for Bytes {
    fn from(content: Content) -> Self {
        content.0
    }
}

impl AsRef<[u8]> for Content {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
