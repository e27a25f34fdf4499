//! The [`RootIndex`] value and its persisted form.

use std::collections::BTreeMap;

use pastedb_codec::Codec;
use pastedb_types::{BlobId, DocRef, Key, Ttl};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// Name of the single part holding the index inside the root blob.
pub const ROOT_PART_NAME: &str = "database.json";

/// Mapping from every document key to the blob that stores it.
///
/// Updates are persistent-style: [`RootIndex::with`] and
/// [`RootIndex::without`] return a new index and leave `self` as it was.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootIndex {
    entries: BTreeMap<Key, DocRef>,
}

impl RootIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&DocRef> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// A copy of this index with `key` pointing at `doc_ref`.
    pub fn with(&self, key: Key, doc_ref: DocRef) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key, doc_ref);
        Self { entries }
    }

    /// A copy of this index without `key`.
    pub fn without(&self, key: &Key) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(key);
        Self { entries }
    }

    /// All keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &DocRef)> {
        self.entries.iter()
    }

    /// Keys whose index-level TTL has run out at `now_ms`.
    pub fn expired_keys(&self, now_ms: u64) -> Vec<Key> {
        self.entries
            .iter()
            .filter(|(_, r)| r.ttl.is_expired_at(now_ms))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Encode the index as the content of [`ROOT_PART_NAME`].
    pub fn encode(&self, codec: &Codec) -> IndexResult<String> {
        Ok(codec.serialize(self)?)
    }

    /// The root blob's part set for this index.
    pub fn to_parts(&self, codec: &Codec) -> IndexResult<BTreeMap<String, String>> {
        Ok(BTreeMap::from([(ROOT_PART_NAME.to_string(), self.encode(codec)?)]))
    }

    /// Decode the index from the parts of the root blob.
    pub fn from_parts(parts: &BTreeMap<String, String>, codec: &Codec) -> IndexResult<Self> {
        let text = parts.get(ROOT_PART_NAME).ok_or(IndexError::MissingPart)?;
        Self::decode(text, codec)
    }

    /// Decode index text.
    ///
    /// Besides the flat `{ "a.b": {id, ttl} }` layout this accepts the older
    /// nested layout (`{ "a": { "b": {id, ttl} } }`), flattening nested
    /// objects into dotted keys. Entries whose `ttl` lacks `createdAt` get a
    /// creation time of zero.
    pub fn decode(text: &str, codec: &Codec) -> IndexResult<Self> {
        let value: Value = codec.deserialize(text)?;
        let Value::Object(root) = value else {
            return Err(IndexError::MalformedEntry {
                key: String::new(),
                reason: "index is not a JSON object".into(),
            });
        };

        let mut entries = BTreeMap::new();
        flatten_into(&mut entries, None, root)?;
        debug!(entries = entries.len(), "decoded root index");
        Ok(Self { entries })
    }
}

fn flatten_into(
    entries: &mut BTreeMap<Key, DocRef>,
    prefix: Option<&str>,
    object: Map<String, Value>,
) -> IndexResult<()> {
    for (segment, value) in object {
        let key = match prefix {
            Some(p) => format!("{p}.{segment}"),
            None => segment,
        };
        match value {
            Value::Object(map) if is_doc_ref(&map) => {
                let doc_ref = parse_doc_ref(&key, map)?;
                entries.insert(Key::new(key), doc_ref);
            }
            Value::Object(map) => flatten_into(entries, Some(&key), map)?,
            other => {
                return Err(IndexError::MalformedEntry {
                    key,
                    reason: format!("expected an object, found {other}"),
                })
            }
        }
    }
    Ok(())
}

fn is_doc_ref(map: &Map<String, Value>) -> bool {
    matches!(map.get("id"), Some(Value::String(_)))
}

fn parse_doc_ref(key: &str, map: Map<String, Value>) -> IndexResult<DocRef> {
    let id = match map.get("id") {
        Some(Value::String(id)) => BlobId::new(id.clone()),
        _ => {
            return Err(IndexError::MalformedEntry {
                key: key.to_string(),
                reason: "missing blob id".into(),
            })
        }
    };

    let ttl = match map.get("ttl") {
        Some(Value::Object(ttl)) => Ttl {
            created_at: ttl.get("createdAt").and_then(Value::as_u64).unwrap_or(0),
            ttl: ttl.get("ttl").and_then(Value::as_u64).filter(|ms| *ms > 0),
        },
        None | Some(Value::Null) => Ttl::forever(0),
        Some(other) => {
            return Err(IndexError::MalformedEntry {
                key: key.to_string(),
                reason: format!("ttl is not an object: {other}"),
            })
        }
    };

    Ok(DocRef::new(id, ttl))
}
