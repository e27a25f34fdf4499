//! High-level API for PasteDB.
//!
//! PasteDB turns a paste/blob hosting service into a document key-value
//! store. Values are JSON objects addressed by dotted keys, with optional
//! time-to-live, optimistic-concurrency revisions, and attached files.
//!
//! ```no_run
//! # async fn demo() -> pastedb_sdk::DbResult<()> {
//! use std::sync::Arc;
//! use pastedb_sdk::{DatabaseConfig, InMemoryBlobStore, PasteDb, SetOptions};
//! use serde_json::json;
//!
//! let db = PasteDb::init(DatabaseConfig::default(), Arc::new(InMemoryBlobStore::new())).await?;
//! let doc = db.set("users.alice", SetOptions::new(json!({"age": 30}))).await?;
//! let again = db.get("users.alice").await?.expect("present");
//! assert_eq!(again.rev, doc.rev);
//! # Ok(())
//! # }
//! ```
//!
//! This is the main entry point for applications embedding PasteDB.

pub mod attachment;
pub mod config;
pub mod database;
pub mod document;
pub mod error;

pub use attachment::{AttachmentManager, Files};
pub use config::DatabaseConfig;
pub use database::{DestroyReport, PasteDb};
pub use document::{Document, SetOptions};
pub use error::{DbError, DbResult};

// Re-export key types
pub use pastedb_codec::{Cipher, Codec, CompressionMode};
pub use pastedb_pack::{ChunkLimits, MAX_CHUNKS_PER_BLOB, MAX_CHUNK_BYTES};
pub use pastedb_store::{BlobTransport, FsBlobStore, InMemoryBlobStore};
pub use pastedb_types::{BlobId, BlobRef, Key, Revision, Ttl};
