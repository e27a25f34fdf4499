use std::collections::BTreeMap;

use pastedb_codec::Codec;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{PackError, PackResult};
use crate::naming::chunk_index;

/// Reassemble a record from the parts of a blob.
///
/// Only parts named like chunks (`<key>_<index>.json`) are considered; any
/// other part is ignored. Chunk contents are shallow-merged. Chunks of one
/// record hold disjoint fields, so merge order does not matter; they are
/// still merged by ascending index to keep the result deterministic.
///
/// Returns `Ok(None)` if the blob holds no chunks at all.
pub fn unpack(parts: &BTreeMap<String, String>, codec: &Codec) -> PackResult<Option<Map<String, Value>>> {
    let mut chunks: Vec<(usize, &String, &String)> = parts
        .iter()
        .filter_map(|(name, content)| chunk_index(name).map(|i| (i, name, content)))
        .collect();
    if chunks.is_empty() {
        return Ok(None);
    }
    chunks.sort_by_key(|(index, _, _)| *index);

    let mut record = Map::new();
    for (index, name, content) in chunks {
        let decoded: Value = codec.deserialize(content)?;
        let Value::Object(fields) = decoded else {
            return Err(PackError::CorruptChunk {
                name: name.clone(),
                reason: "chunk is not a JSON object".into(),
            });
        };
        trace!(index, fields = fields.len(), "merging chunk");
        record.extend(fields);
    }
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::ChunkLimits;
    use crate::writer::pack;
    use pastedb_codec::{Cipher, CompressionMode};
    use pastedb_types::Key;
    use proptest::prelude::*;
    use serde_json::json;

    fn plain() -> Codec {
        Codec::plain(CompressionMode::None)
    }

    #[test]
    fn ignores_unrelated_parts() {
        let parts = BTreeMap::from([
            ("database.json".to_string(), "not even json".to_string()),
            ("doc_0.json".to_string(), r#"{"a":1}"#.to_string()),
            ("doc_1.json".to_string(), r#"{"b":2}"#.to_string()),
            ("README.md".to_string(), "# hi".to_string()),
        ]);
        let record = unpack(&parts, &plain()).unwrap().unwrap();
        assert_eq!(Value::Object(record), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn no_chunks_is_none() {
        let parts = BTreeMap::from([("database.json".to_string(), "{}".to_string())]);
        assert!(unpack(&parts, &plain()).unwrap().is_none());
        assert!(unpack(&BTreeMap::new(), &plain()).unwrap().is_none());
    }

    #[test]
    fn non_object_chunk_is_corrupt() {
        let parts = BTreeMap::from([("doc_0.json".to_string(), "[1,2]".to_string())]);
        assert!(matches!(
            unpack(&parts, &plain()),
            Err(PackError::CorruptChunk { .. })
        ));
    }

    #[test]
    fn undecodable_chunk_is_codec_error() {
        let parts = BTreeMap::from([("doc_0.json".to_string(), "{broken".to_string())]);
        assert!(matches!(unpack(&parts, &plain()), Err(PackError::Codec(_))));
    }

    #[test]
    fn pack_unpack_every_codec() {
        let record: Map<String, Value> = (0..12)
            .map(|i| (format!("field{i:02}"), json!({"i": i, "pad": "z".repeat(60)})))
            .collect();
        let cipher = Cipher::from_passphrase("pw").unwrap();
        let limits = ChunkLimits::new(800, 10);
        for mode in CompressionMode::ALL {
            for codec in [Codec::plain(mode), Codec::new(mode, Some(cipher.clone()))] {
                let chunks = pack(&Key::from("rt"), &record, &codec, &limits).unwrap();
                let back = unpack(&chunks, &codec).unwrap().unwrap();
                assert_eq!(back, record, "mode {mode}");
            }
        }
    }

    proptest! {
        #[test]
        fn prop_fragmentation_roundtrip(
            widths in prop::collection::vec(0usize..120, 0..30),
            max_chunk_bytes in 140usize..600,
            max_chunks in 1usize..12,
        ) {
            let record: Map<String, Value> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| (format!("k{i:03}"), Value::String("v".repeat(*w))))
                .collect();
            let limits = ChunkLimits::new(max_chunk_bytes, max_chunks);
            let codec = plain();
            let total = codec.serialize(&record).unwrap().len();

            match pack(&Key::from("p"), &record, &codec, &limits) {
                Ok(chunks) => {
                    prop_assert!(total <= limits.capacity());
                    prop_assert!(chunks.len() <= max_chunks);
                    prop_assert!(chunks.values().all(|c| c.len() <= max_chunk_bytes));
                    let back = unpack(&chunks, &codec).unwrap().unwrap();
                    prop_assert_eq!(back, record);
                }
                Err(PackError::ValueTooLarge { .. }) => prop_assert!(total > limits.capacity()),
                Err(PackError::TooManyChunks { count, limit }) => prop_assert!(count > limit),
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
