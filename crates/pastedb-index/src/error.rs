//! Error types for the index crate.

/// Errors that can occur while encoding or decoding the root index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The root blob has no `database.json` part.
    #[error("root index part is missing")]
    MissingPart,

    /// An entry in the stored index is not a valid document reference.
    #[error("malformed index entry {key}: {reason}")]
    MalformedEntry { key: String, reason: String },

    /// The stored index could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] pastedb_codec::CodecError),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
