use std::time::Duration;

use pastedb_types::{BlobId, BlobRef, Key, Revision, Ttl};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::attachment::Files;

/// A document as returned by [`crate::PasteDb::get`] and
/// [`crate::PasteDb::set`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    pub key: Key,
    /// Blob holding the document's chunks.
    pub id: BlobId,
    pub url: String,
    pub value: Map<String, Value>,
    pub rev: Revision,
    pub ttl: Ttl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<BlobRef>,
    /// Attachment contents. [`crate::PasteDb::get`] reads them back.
    /// [`crate::PasteDb::set`] echoes the files it was given, so a `set`
    /// that keeps an existing attachment returns `attachment: Some(..)`
    /// with `files: None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Files>,
}

impl Document {
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.as_ref()?.get(name).map(String::as_str)
    }
}

/// Arguments to [`crate::PasteDb::set`].
#[derive(Clone, Debug, PartialEq)]
pub struct SetOptions {
    /// Must be a JSON object.
    pub value: Value,
    pub ttl: Option<Duration>,
    /// Expected current revision. On a brand-new key it becomes the
    /// initial revision.
    pub rev: Option<Revision>,
    pub files: Option<Files>,
    /// Description given to blobs this write creates.
    pub description: Option<String>,
}

impl SetOptions {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            ttl: None,
            rev: None,
            files: None,
            description: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_rev(mut self, rev: impl Into<Revision>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.files
            .get_or_insert_with(Files::new)
            .insert(name.into(), content.into());
        self
    }

    pub fn with_files(mut self, files: Files) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_builder() {
        let opts = SetOptions::new(json!({"n": 1}))
            .with_ttl(Duration::from_millis(500))
            .with_rev("r1")
            .with_file("a.txt", "hello")
            .with_file("b.txt", "world")
            .with_description("demo");
        assert_eq!(opts.ttl, Some(Duration::from_millis(500)));
        assert_eq!(opts.rev, Some(Revision::new("r1")));
        assert_eq!(opts.files.as_ref().map(|f| f.len()), Some(2));
        assert_eq!(opts.description.as_deref(), Some("demo"));
    }

    #[test]
    fn document_json_omits_empty_attachment() {
        let doc = Document {
            key: Key::from("k"),
            id: BlobId::new("b"),
            url: "memory://b".into(),
            value: Map::new(),
            rev: Revision::new("r"),
            ttl: Ttl::forever(7),
            attachment: None,
            files: None,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            json!({
                "key": "k",
                "id": "b",
                "url": "memory://b",
                "value": {},
                "rev": "r",
                "ttl": {"createdAt": 7}
            })
        );
        assert!(doc.file("x").is_none());
    }
}
