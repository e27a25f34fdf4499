//! Document fragmentation for PasteDB.
//!
//! The host service caps both the size of one text part and the number of
//! parts per blob. A serialized document record can exceed the first cap,
//! so it is sharded on its top-level fields into chunks that each fit.
//!
//! # Architecture
//!
//! - [`pack`]: structural bisection of a record into `<key>_<index>.json`
//!   chunks, with pre-flight capacity and post-flight chunk-count checks
//! - [`unpack`]: select chunk parts by name and shallow-merge them back
//! - [`ChunkLimits`]: the per-chunk byte cap and per-blob chunk cap

pub mod error;
pub mod limits;
pub mod naming;
pub mod reader;
pub mod writer;

pub use error::{PackError, PackResult};
pub use limits::{ChunkLimits, MAX_CHUNKS_PER_BLOB, MAX_CHUNK_BYTES};
pub use naming::{chunk_index, chunk_name, is_chunk_name};
pub use reader::unpack;
pub use writer::pack;
