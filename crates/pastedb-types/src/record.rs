use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::blob::{BlobId, BlobRef};
use crate::error::TypeError;
use crate::revision::Revision;
use crate::ttl::Ttl;

/// Root-index pointer from a key to the blob holding its document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRef {
    pub id: BlobId,
    pub ttl: Ttl,
}

impl DocRef {
    pub fn new(id: BlobId, ttl: Ttl) -> Self {
        Self { id, ttl }
    }
}

/// The payload stored inside a document's own blob.
///
/// Serialized as a JSON object with the top-level fields `value`, `ttl`,
/// `rev` and (when an attachment exists) `extraFile`. Those top-level fields
/// are the unit the fragmenter shards on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub value: Map<String, Value>,
    pub ttl: Ttl,
    pub rev: Revision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_file: Option<BlobRef>,
}

impl DocumentRecord {
    /// Build a record from a caller value, rejecting anything that is not a
    /// plain JSON object.
    pub fn new(
        value: Value,
        ttl: Ttl,
        rev: Revision,
        extra_file: Option<BlobRef>,
    ) -> Result<Self, TypeError> {
        Ok(Self {
            value: into_object(value)?,
            ttl,
            rev,
            extra_file,
        })
    }

    /// The record as a JSON object, ready for fragmentation.
    pub fn to_map(&self) -> Result<Map<String, Value>, TypeError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(TypeError::NotAnObject(kind_name(&other))),
            Err(e) => Err(TypeError::Serialization(e.to_string())),
        }
    }

    /// Rebuild a record from a merged JSON object.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, TypeError> {
        serde_json::from_value(Value::Object(map)).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

/// Unwrap a JSON object, rejecting primitives, arrays and null.
pub fn into_object(value: Value) -> Result<Map<String, Value>, TypeError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TypeError::NotAnObject(kind_name(&other))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> DocumentRecord {
        DocumentRecord::new(
            json!({"name": "test_one", "n": 1}),
            Ttl::forever(100),
            Revision::from("r1"),
            None,
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_objects() {
        for bad in [json!(null), json!(1), json!("s"), json!([1, 2]), json!(true)] {
            let err = DocumentRecord::new(bad, Ttl::forever(0), Revision::from("r"), None)
                .unwrap_err();
            assert!(matches!(err, TypeError::NotAnObject(_)));
        }
    }

    #[test]
    fn top_level_fields() {
        let map = record().to_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        assert!(map.contains_key("value"));
        assert!(map.contains_key("ttl"));
        assert!(map.contains_key("rev"));
        assert!(!map.contains_key("extraFile"));
    }

    #[test]
    fn extra_file_uses_camel_case() {
        let mut rec = record();
        rec.extra_file = Some(BlobRef::new("att", "memory://att"));
        let map = rec.to_map().unwrap();
        assert_eq!(map["extraFile"], json!({"id": "att", "url": "memory://att"}));
    }

    #[test]
    fn map_roundtrip() {
        let rec = record();
        let back = DocumentRecord::from_map(rec.to_map().unwrap()).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn from_map_rejects_missing_fields() {
        let mut map = Map::new();
        map.insert("value".into(), json!({}));
        assert!(matches!(
            DocumentRecord::from_map(map),
            Err(TypeError::Serialization(_))
        ));
    }
}
