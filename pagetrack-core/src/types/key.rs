//! Access keys and the store key space derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONTENT_PREFIX, DEFAULT_COUNT_PREFIX};
use crate::error::{Result, TrackerError};

/// Identifier of a cacheable resource, usually a URL.
///
/// Keys are opaque: they are compared byte for byte and never normalized,
/// so `http://A` and `http://a` are tracked separately.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessKey(String);

impl AccessKey {
    /// Creates a key, rejecting empty and whitespace-only input.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(TrackerError::InvalidKey(
                "access key cannot be empty".into(),
            ));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccessKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccessKey {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for AccessKey {
    type Error = TrackerError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<AccessKey> for String {
    fn from(key: AccessKey) -> Self {
        key.0
    }
}

impl std::str::FromStr for AccessKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Derives the two store keys of an [`AccessKey`].
///
/// `count_key(k) = count_prefix + k` holds the access counter and
/// `content_key(k) = content_prefix + k` holds the cached body.
///
/// Neither prefix may be empty or a prefix of the other. Under that rule two
/// derived keys from different namespaces always differ within the shorter
/// prefix, so a counter and a cached body can never share a store key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySpace {
    count_prefix: String,
    content_prefix: String,
}

impl KeySpace {
    /// Creates a key space with custom prefixes.
    pub fn new(count_prefix: impl Into<String>, content_prefix: impl Into<String>) -> Result<Self> {
        let count_prefix = count_prefix.into();
        let content_prefix = content_prefix.into();

        if count_prefix.is_empty() || content_prefix.is_empty() {
            return Err(TrackerError::ConfigError(
                "key prefixes cannot be empty".into(),
            ));
        }
        if count_prefix.starts_with(&content_prefix) || content_prefix.starts_with(&count_prefix) {
            return Err(TrackerError::ConfigError(format!(
                "key prefixes '{}' and '{}' overlap",
                count_prefix, content_prefix
            )));
        }

        Ok(Self {
            count_prefix,
            content_prefix,
        })
    }

    /// Store key of the access counter.
    pub fn count_key(&self, key: &AccessKey) -> String {
        format!("{}{}", self.count_prefix, key.as_str())
    }

    /// Store key of the cached body.
    pub fn content_key(&self, key: &AccessKey) -> String {
        format!("{}{}", self.content_prefix, key.as_str())
    }

    /// Counter namespace prefix.
    pub fn count_prefix(&self) -> &str {
        &self.count_prefix
    }

    /// Content namespace prefix.
    pub fn content_prefix(&self) -> &str {
        &self.content_prefix
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self {
            count_prefix: DEFAULT_COUNT_PREFIX.into(),
            content_prefix: DEFAULT_CONTENT_PREFIX.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test]
    fn test_access_key_rejects_empty() {
        assert!(AccessKey::new("").is_err());
        assert!(AccessKey::new("   \t").is_err());
        assert!(matches!(AccessKey::new(""), Err(TrackerError::InvalidKey(_))));
    }

    #[test]
    fn test_access_key_is_not_normalized() {
        let a = AccessKey::new("http://Example.com").unwrap();
        let b = AccessKey::new("http://example.com").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "http://Example.com");
    }

    #[test]
    fn test_access_key_serde() {
        let key = AccessKey::new("http://a/b").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"http://a/b\"");
        let back: AccessKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<AccessKey>("\"\"").is_err());
    }

    #[test]
    fn test_default_key_space() {
        let space = KeySpace::default();
        let key = AccessKey::new("http://slow.example/1000").unwrap();
        assert_eq!(space.count_key(&key), "count:http://slow.example/1000");
        assert_eq!(space.content_key(&key), "cached:http://slow.example/1000");
    }

    #[test_case("", "cached:" ; "empty count prefix")]
    #[test_case("count:", "" ; "empty content prefix")]
    #[test_case("same:", "same:" ; "equal prefixes")]
    #[test_case("c", "c:" ; "count prefix is prefix of content")]
    #[test_case("page:cache:", "page:" ; "content prefix is prefix of count")]
    fn test_key_space_rejects(count: &str, content: &str) {
        assert!(matches!(
            KeySpace::new(count, content),
            Err(TrackerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_custom_key_space() {
        let space = KeySpace::new("hits/", "page/").unwrap();
        let key = AccessKey::new("u").unwrap();
        assert_eq!(space.count_key(&key), "hits/u");
        assert_eq!(space.content_key(&key), "page/u");
    }

    proptest! {
        #[test]
        fn prop_namespaces_never_collide(a in "[a-zA-Z0-9:/._-]{1,64}", b in "[a-zA-Z0-9:/._-]{1,64}") {
            let space = KeySpace::default();
            let ka = AccessKey::new(a).unwrap();
            let kb = AccessKey::new(b).unwrap();
            prop_assert_ne!(space.count_key(&ka), space.content_key(&kb));
        }

        #[test]
        fn prop_derivation_is_deterministic(a in "[a-z:/.]{1,40}") {
            let space = KeySpace::default();
            let key = AccessKey::new(a).unwrap();
            prop_assert_eq!(space.count_key(&key), space.count_key(&key.clone()));
            prop_assert_eq!(space.content_key(&key), space.content_key(&key.clone()));
        }
    }
}
