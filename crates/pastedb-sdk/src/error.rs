use pastedb_codec::CodecError;
use pastedb_index::IndexError;
use pastedb_pack::PackError;
use pastedb_store::BlobError;
use pastedb_types::{BlobId, Key, Revision, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The key or value was rejected before anything was sent to the store.
    #[error("validation error: {0}")]
    Validation(String),

    /// The document (or its attachments) cannot fit in one blob.
    #[error("size limit exceeded: {0}")]
    SizeLimit(String),

    /// The caller's expected revision is not the stored one.
    #[error("revision conflict on {key}: expected {expected}, found {actual}")]
    RevisionConflict {
        key: Key,
        expected: Revision,
        actual: Revision,
    },

    /// Stored content could not be decrypted or parsed.
    #[error("value unreadable: {0}")]
    Decode(String),

    /// A value could not be encoded, compressed or encrypted for writing.
    #[error("value could not be encoded: {0}")]
    Encode(String),

    #[error("transport error: {0}")]
    Transport(#[from] BlobError),

    /// The configured root blob does not exist.
    #[error("database root not found: {0}")]
    RootNotFound(BlobId),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<PackError> for DbError {
    fn from(e: PackError) -> Self {
        match e {
            PackError::ValueTooLarge { .. }
            | PackError::TooManyChunks { .. }
            | PackError::FieldTooLarge { .. } => Self::SizeLimit(e.to_string()),
            PackError::CorruptChunk { .. } => Self::Decode(e.to_string()),
            PackError::Codec(codec) => codec.into(),
        }
    }
}

impl From<CodecError> for DbError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::UnknownMode(_) | CodecError::InvalidKey(_) => Self::Config(e.to_string()),
            CodecError::Encode(_) | CodecError::CompressionFailed(_) | CodecError::Encryption(_) => {
                Self::Encode(e.to_string())
            }
            CodecError::Decode(_)
            | CodecError::DecompressionFailed(_)
            | CodecError::Decryption(_) => Self::Decode(e.to_string()),
        }
    }
}

impl From<IndexError> for DbError {
    fn from(e: IndexError) -> Self {
        Self::Decode(format!("root index: {e}"))
    }
}

impl From<TypeError> for DbError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::Serialization(msg) => Self::Decode(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
