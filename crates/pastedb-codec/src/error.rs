use thiserror::Error;

/// Errors from encoding or decoding stored text.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be turned into JSON.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The stored text could not be parsed back into a value.
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Wrong key or tampered ciphertext.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("unknown compression mode: {0}")]
    UnknownMode(String),

    #[error("invalid encryption key: {0}")]
    InvalidKey(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
