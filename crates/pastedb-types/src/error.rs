use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("document value must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("serialization error: {0}")]
    Serialization(String),
}
