use std::collections::BTreeMap;

use pastedb_codec::Codec;
use pastedb_types::Key;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{PackError, PackResult};
use crate::limits::ChunkLimits;
use crate::naming::chunk_name;

type Field<'a> = (&'a String, &'a Value);

/// Split `record` into named chunks that each serialize within
/// `limits.max_chunk_bytes`.
///
/// A record that fits is emitted whole as chunk 0. Otherwise its top-level
/// fields are bisected by count (the first half takes `ceil(n/2)` fields)
/// and each half is handled the same way until it fits. Chunks are numbered
/// in left-to-right emission order.
///
/// Fails with:
/// - [`PackError::ValueTooLarge`] before splitting, if the serialized record
///   exceeds `max_chunk_bytes * max_chunks`
/// - [`PackError::FieldTooLarge`] if one field alone exceeds a chunk
/// - [`PackError::TooManyChunks`] if the split needs more than `max_chunks`
pub fn pack(
    key: &Key,
    record: &Map<String, Value>,
    codec: &Codec,
    limits: &ChunkLimits,
) -> PackResult<BTreeMap<String, String>> {
    let whole = codec.serialize(record)?;
    let capacity = limits.capacity();
    if whole.len() > capacity {
        return Err(PackError::ValueTooLarge {
            size: whole.len(),
            capacity,
        });
    }

    if whole.len() <= limits.max_chunk_bytes {
        return Ok(BTreeMap::from([(chunk_name(key, 0), whole)]));
    }

    let fields: Vec<Field<'_>> = record.iter().collect();
    let leaves = bisect(&fields, codec, limits.max_chunk_bytes)?;

    if leaves.len() > limits.max_chunks {
        return Err(PackError::TooManyChunks {
            count: leaves.len(),
            limit: limits.max_chunks,
        });
    }

    debug!(
        %key,
        size = whole.len(),
        chunks = leaves.len(),
        "fragmented record"
    );

    Ok(leaves
        .into_iter()
        .enumerate()
        .map(|(index, content)| (chunk_name(key, index), content))
        .collect())
}

/// Iterative depth-first bisection. Returns encoded leaves in emission order.
fn bisect(fields: &[Field<'_>], codec: &Codec, max_bytes: usize) -> PackResult<Vec<String>> {
    let mut leaves = Vec::new();
    let mut pending: Vec<&[Field<'_>]> = vec![fields];

    while let Some(slice) = pending.pop() {
        let part: Map<String, Value> = slice
            .iter()
            .map(|(k, v)| ((*k).clone(), (*v).clone()))
            .collect();
        let encoded = codec.serialize(&part)?;

        if encoded.len() <= max_bytes {
            leaves.push(encoded);
            continue;
        }

        // A single field is the atomic unit; it cannot shrink any further.
        if slice.len() <= 1 {
            return Err(PackError::FieldTooLarge {
                field: slice.first().map(|(k, _)| (*k).clone()),
                size: encoded.len(),
                limit: max_bytes,
            });
        }

        let mid = slice.len().div_ceil(2);
        // Right half first so the left half is popped (emitted) first.
        pending.push(&slice[mid..]);
        pending.push(&slice[..mid]);
    }

    Ok(leaves)
}
