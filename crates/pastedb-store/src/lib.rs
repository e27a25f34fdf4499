//! Blob transport for PasteDB.
//!
//! PasteDB stores everything in a remote "paste" service: opaque blobs, each
//! holding a mapping of named text parts. This crate defines the
//! [`BlobTransport`] contract the document engine talks to and ships two
//! local backends.
//!
//! # Storage Backends
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding,
//!   with optional [`BlobLimits`] that model the host service's size caps
//! - [`FsBlobStore`] -- one CRC-framed file per blob under a root directory
//!
//! # Contract
//!
//! 1. `read_blob` of an unknown id is `Ok(None)`, not an error.
//! 2. `update_blob` replaces the whole part set of an existing blob.
//! 3. `delete_blob` is idempotent; deleting an unknown id returns `false`.
//! 4. Each part is text; backends may reject parts over their size cap.

pub mod blob;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use blob::{Blob, BlobLimits, NewBlob, Parts};
pub use error::{BlobError, BlobResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::BlobTransport;
