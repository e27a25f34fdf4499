//! Root index for PasteDB.
//!
//! The [`RootIndex`] is the single map from every document key to the blob
//! holding that document ([`DocRef`](pastedb_types::DocRef)). It lives in
//! its own blob, as one reserved part named [`ROOT_PART_NAME`].
//!
//! Keys are flat dotted strings. Every update returns a new index value and
//! leaves the original untouched; persisting it is the caller's job.

pub mod error;
pub mod index;

pub use error::{IndexError, IndexResult};
pub use index::{RootIndex, ROOT_PART_NAME};
