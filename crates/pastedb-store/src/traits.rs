use async_trait::async_trait;
use pastedb_types::BlobId;

use crate::blob::{Blob, NewBlob, Parts};
use crate::error::BlobResult;

/// Remote blob service.
///
/// All implementations must satisfy these invariants:
/// - `read_blob` returns `Ok(None)` for an id that does not exist.
/// - `update_blob` replaces the entire part set; parts not named in the
///   update are gone afterwards.
/// - `delete_blob` is idempotent and reports whether anything was removed.
/// - Retries, timeouts and cancellation belong to the implementation, not
///   to callers.
#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// Create a blob and return it with its assigned id and URL.
    async fn create_blob(&self, blob: NewBlob) -> BlobResult<Blob>;

    /// Read a blob by id.
    async fn read_blob(&self, id: &BlobId) -> BlobResult<Option<Blob>>;

    /// Replace the parts of an existing blob.
    ///
    /// Returns `BlobError::NotFound` if the blob does not exist.
    async fn update_blob(&self, id: &BlobId, parts: Parts) -> BlobResult<Blob>;

    /// Delete a blob. Returns `true` if it existed.
    async fn delete_blob(&self, id: &BlobId) -> BlobResult<bool>;

    /// Check whether a blob exists.
    ///
    /// Default implementation reads the whole blob. Backends may override
    /// with something cheaper.
    async fn blob_exists(&self, id: &BlobId) -> BlobResult<bool> {
        Ok(self.read_blob(id).await?.is_some())
    }
}
