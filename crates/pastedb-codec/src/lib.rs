//! Serialization codec for PasteDB.
//!
//! Everything PasteDB writes to a blob passes through a [`Codec`]: a
//! [`CompressionMode`] strategy that turns a value into text, optionally
//! wrapped by a [`Cipher`] that encrypts the text last on the way out and
//! decrypts it first on the way in.
//!
//! # Modes
//!
//! - [`CompressionMode::None`]: compact JSON
//! - [`CompressionMode::Pretty`]: indented JSON, same information content
//! - [`CompressionMode::Binary`]: zstd-compressed JSON, base64 text
//!
//! The encryption key is never written into the payload.

pub mod cipher;
pub mod codec;
pub mod error;
pub mod mode;

pub use cipher::Cipher;
pub use codec::Codec;
pub use error::{CodecError, CodecResult};
pub use mode::CompressionMode;
