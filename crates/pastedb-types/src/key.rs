use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Separator used to flatten path segments into a single key.
pub const KEY_SEPARATOR: char = '.';

/// A document key.
///
/// Keys are flat dotted strings. A key built from the segments
/// `["a", "b"]` is the same entry as the key `"a.b"`; no hierarchical
/// traversal ever happens on the key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Build a key from an already-flattened string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build a key by joining path segments with `.`.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self(joined)
    }

    /// The flattened key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The individual path segments of this key.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(KEY_SEPARATOR)
    }

    /// Reject keys that cannot address a document.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.0.is_empty() {
            return Err(TypeError::InvalidKey("key is empty".into()));
        }
        if self.segments().any(str::is_empty) {
            return Err(TypeError::InvalidKey(format!(
                "key {:?} has an empty path segment",
                self.0
            )));
        }
        if self.0.contains(['/', '\\']) {
            return Err(TypeError::InvalidKey(format!(
                "key {:?} contains a path separator",
                self.0
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&String> for Key {
    fn from(key: &String) -> Self {
        Self(key.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<Vec<String>> for Key {
    fn from(segments: Vec<String>) -> Self {
        Self::from_segments(segments)
    }
}

impl From<&[&str]> for Key {
    fn from(segments: &[&str]) -> Self {
        Self::from_segments(segments)
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(segments: [&str; N]) -> Self {
        Self::from_segments(segments)
    }
}
