use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use pastedb_types::BlobId;

use crate::blob::{generate_blob_id, Blob, BlobLimits, NewBlob, Parts};
use crate::error::{BlobError, BlobResult};
use crate::traits::BlobTransport;

const URL_SCHEME: &str = "memory://";

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` and
/// cloned on read/write. Mutating calls are counted so tests can assert that
/// a rejected operation never reached the transport.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobId, Blob>>,
    limits: BlobLimits,
    mutations: AtomicU64,
}

impl InMemoryBlobStore {
    /// Create a new empty store without size limits.
    pub fn new() -> Self {
        Self::with_limits(BlobLimits::unlimited())
    }

    /// Create a store that rejects writes violating `limits`.
    pub fn with_limits(limits: BlobLimits) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            limits,
            mutations: AtomicU64::new(0),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Whether a blob with this id is stored.
    pub fn contains(&self, id: &BlobId) -> bool {
        self.blobs.read().expect("lock poisoned").contains_key(id)
    }

    /// Sorted list of all blob ids in the store.
    pub fn all_ids(&self) -> Vec<BlobId> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut ids: Vec<BlobId> = map.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of create/update/delete calls made so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    fn url_for(id: &BlobId) -> String {
        format!("{URL_SCHEME}{id}")
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> BlobError {
        BlobError::Backend(format!("lock poisoned: {e}"))
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobTransport for InMemoryBlobStore {
    async fn create_blob(&self, blob: NewBlob) -> BlobResult<Blob> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.limits.check(&blob.parts)?;

        let id = generate_blob_id();
        let stored = Blob {
            url: Self::url_for(&id),
            id: id.clone(),
            description: blob.description,
            public: blob.public,
            parts: blob.parts,
        };
        let mut map = self.blobs.write().map_err(Self::poisoned)?;
        map.insert(id, stored.clone());
        Ok(stored)
    }

    async fn read_blob(&self, id: &BlobId) -> BlobResult<Option<Blob>> {
        let map = self.blobs.read().map_err(Self::poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn update_blob(&self, id: &BlobId, parts: Parts) -> BlobResult<Blob> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.limits.check(&parts)?;

        let mut map = self.blobs.write().map_err(Self::poisoned)?;
        let blob = map
            .get_mut(id)
            .ok_or_else(|| BlobError::NotFound(id.clone()))?;
        blob.parts = parts;
        Ok(blob.clone())
    }

    async fn delete_blob(&self, id: &BlobId) -> BlobResult<bool> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut map = self.blobs.write().map_err(Self::poisoned)?;
        Ok(map.remove(id).is_some())
    }

    async fn blob_exists(&self, id: &BlobId) -> BlobResult<bool> {
        let map = self.blobs.read().map_err(Self::poisoned)?;
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .field("limits", &self.limits)
            .finish()
    }
}
