use pastedb_types::BlobId;

/// Errors from blob transport operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The blob does not exist (only returned by operations that need it to).
    #[error("blob not found: {0}")]
    NotFound(BlobId),

    /// A single part exceeds the backend's per-part size cap.
    #[error("part {name} is {size} bytes, limit is {limit}")]
    PartTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    /// The blob has more parts than the backend allows.
    #[error("blob has {count} parts, limit is {limit}")]
    TooManyParts { count: usize, limit: usize },

    /// Stored data failed its integrity check.
    #[error("corrupt blob {id}: {reason}")]
    Corrupt { id: BlobId, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure (remote errors, poisoned locks, ...).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for transport operations.
pub type BlobResult<T> = Result<T, BlobError>;
