use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a remote blob.
///
/// The transport hands these out on creation; PasteDB never interprets them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(String);

impl BlobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.0)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BlobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A blob id together with the URL the host service exposes it at.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    pub id: BlobId,
    pub url: String,
}

impl BlobRef {
    pub fn new(id: impl Into<BlobId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_id_display_and_debug() {
        let id = BlobId::new("abc123");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(format!("{id:?}"), "BlobId(abc123)");
    }

    #[test]
    fn blob_ref_json_shape() {
        let r = BlobRef::new("abc", "memory://abc");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({"id": "abc", "url": "memory://abc"}));
    }
}
