//! Foundation types for PasteDB.
//!
//! PasteDB turns a paste/blob hosting service into a document store. This
//! crate holds the vocabulary shared by every other PasteDB crate.
//!
//! # Key Types
//!
//! - [`Key`]: flattened dotted document key
//! - [`BlobId`] / [`BlobRef`]: opaque remote blob identifier and its public URL
//! - [`Ttl`]: creation timestamp plus optional time-to-live
//! - [`Revision`]: opaque optimistic-concurrency token
//! - [`DocRef`]: root-index pointer from a key to its document blob
//! - [`DocumentRecord`]: the payload stored inside a document blob

pub mod blob;
pub mod error;
pub mod key;
pub mod record;
pub mod revision;
pub mod ttl;

pub use blob::{BlobId, BlobRef};
pub use error::TypeError;
pub use key::Key;
pub use record::{into_object, DocRef, DocumentRecord};
pub use revision::Revision;
pub use ttl::{now_ms, Ttl};
