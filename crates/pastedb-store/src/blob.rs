use std::collections::BTreeMap;

use pastedb_types::{BlobId, BlobRef};
use serde::{Deserialize, Serialize};

use crate::error::{BlobError, BlobResult};

/// Named text parts of a blob.
pub type Parts = BTreeMap<String, String>;

/// A remote blob: an id, its public URL, and its named text parts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub id: BlobId,
    pub url: String,
    pub description: Option<String>,
    pub public: bool,
    pub parts: Parts,
}

impl Blob {
    /// The `{id, url}` pair callers keep to find this blob again.
    pub fn reference(&self) -> BlobRef {
        BlobRef::new(self.id.clone(), self.url.clone())
    }

    pub fn part(&self, name: &str) -> Option<&str> {
        self.parts.get(name).map(String::as_str)
    }

    /// Total bytes across all parts.
    pub fn total_bytes(&self) -> usize {
        self.parts.values().map(String::len).sum()
    }
}

/// Everything needed to create a blob; the transport assigns id and URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewBlob {
    pub parts: Parts,
    pub public: bool,
    pub description: Option<String>,
}

impl NewBlob {
    pub fn new(parts: Parts) -> Self {
        Self {
            parts,
            ..Self::default()
        }
    }

    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// Size caps a backend enforces on the parts of a single blob.
///
/// `None` means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlobLimits {
    pub max_part_bytes: Option<usize>,
    pub max_parts: Option<usize>,
}

impl BlobLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn new(max_part_bytes: usize, max_parts: usize) -> Self {
        Self {
            max_part_bytes: Some(max_part_bytes),
            max_parts: Some(max_parts),
        }
    }

    /// Reject a part set that violates these limits.
    pub fn check(&self, parts: &Parts) -> BlobResult<()> {
        if let Some(limit) = self.max_parts {
            if parts.len() > limit {
                return Err(BlobError::TooManyParts {
                    count: parts.len(),
                    limit,
                });
            }
        }
        if let Some(limit) = self.max_part_bytes {
            if let Some((name, content)) = parts.iter().find(|(_, c)| c.len() > limit) {
                return Err(BlobError::PartTooLarge {
                    name: name.clone(),
                    size: content.len(),
                    limit,
                });
            }
        }
        Ok(())
    }
}

/// A fresh random blob id (32 hex characters).
pub(crate) fn generate_blob_id() -> BlobId {
    use rand::RngCore;

    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    BlobId::new(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(entries: &[(&str, &str)]) -> Parts {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unlimited_accepts_anything() {
        let p = parts(&[("a", &"x".repeat(10_000))]);
        assert!(BlobLimits::unlimited().check(&p).is_ok());
    }

    #[test]
    fn part_size_limit() {
        let limits = BlobLimits::new(4, 10);
        assert!(limits.check(&parts(&[("a", "1234")])).is_ok());
        let err = limits.check(&parts(&[("a", "12345")])).unwrap_err();
        assert!(matches!(err, BlobError::PartTooLarge { size: 5, limit: 4, .. }));
    }

    #[test]
    fn part_count_limit() {
        let limits = BlobLimits::new(100, 2);
        let err = limits
            .check(&parts(&[("a", ""), ("b", ""), ("c", "")]))
            .unwrap_err();
        assert!(matches!(err, BlobError::TooManyParts { count: 3, limit: 2 }));
    }

    #[test]
    fn generated_ids_are_distinct_hex() {
        let a = generate_blob_id();
        let b = generate_blob_id();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn blob_helpers() {
        let blob = Blob {
            id: BlobId::new("id1"),
            url: "memory://id1".into(),
            description: None,
            public: false,
            parts: parts(&[("x.json", "abc"), ("y.json", "de")]),
        };
        assert_eq!(blob.part("x.json"), Some("abc"));
        assert_eq!(blob.part("missing"), None);
        assert_eq!(blob.total_bytes(), 5);
        assert_eq!(blob.reference(), BlobRef::new("id1", "memory://id1"));
    }
}
