use pastedb_codec::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    /// The whole record is larger than every chunk put together could hold.
    #[error("value too large: {size} bytes exceeds capacity of {capacity} bytes")]
    ValueTooLarge { size: usize, capacity: usize },

    /// Fragmentation succeeded but produced more chunks than a blob may hold.
    #[error("too many files: fragmentation produced {count} chunks, limit is {limit}")]
    TooManyChunks { count: usize, limit: usize },

    /// A single top-level field does not fit in one chunk on its own.
    #[error("field too large to fragment: {field:?} is {size} bytes, chunk limit is {limit}")]
    FieldTooLarge {
        field: Option<String>,
        size: usize,
        limit: usize,
    },

    /// A chunk decoded to something other than a JSON object.
    #[error("corrupt chunk {name}: {reason}")]
    CorruptChunk { name: String, reason: String },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

pub type PackResult<T> = Result<T, PackError>;
