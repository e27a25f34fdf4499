//! Secondary blobs holding caller-supplied files.
//!
//! A document may own one attachment blob. The document record points at
//! it through `extraFile`; the root index never does. File contents pass
//! through the codec's cipher only, so what the caller stored is what they
//! read back, byte for byte.

use std::collections::BTreeMap;
use std::sync::Arc;

use pastedb_codec::Codec;
use pastedb_pack::ChunkLimits;
use pastedb_store::{BlobError, BlobTransport, NewBlob, Parts};
use pastedb_types::BlobRef;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Named file contents of an attachment.
pub type Files = BTreeMap<String, String>;

pub struct AttachmentManager {
    transport: Arc<dyn BlobTransport>,
    codec: Codec,
    limits: ChunkLimits,
    public: bool,
}

impl AttachmentManager {
    pub fn new(
        transport: Arc<dyn BlobTransport>,
        codec: Codec,
        limits: ChunkLimits,
        public: bool,
    ) -> Self {
        Self {
            transport,
            codec,
            limits,
            public,
        }
    }

    /// Check `files` and encode them into blob parts without touching the
    /// transport.
    pub fn prepare(&self, files: &Files) -> DbResult<Parts> {
        if files.is_empty() {
            return Err(DbError::Validation("attachment has no files".into()));
        }
        if files.len() > self.limits.max_chunks {
            return Err(DbError::SizeLimit(format!(
                "too many files in attachment: {} (limit {})",
                files.len(),
                self.limits.max_chunks
            )));
        }

        let mut parts = Parts::new();
        for (name, content) in files {
            if name.trim().is_empty() || name.contains('/') {
                return Err(DbError::Validation(format!("invalid file name {name:?}")));
            }
            let sealed = self.codec.seal(content)?;
            if sealed.len() > self.limits.max_chunk_bytes {
                return Err(DbError::SizeLimit(format!(
                    "file {name} too large: {} bytes (limit {})",
                    sealed.len(),
                    self.limits.max_chunk_bytes
                )));
            }
            parts.insert(name.clone(), sealed);
        }
        Ok(parts)
    }

    /// Write prepared parts, replacing the contents of `existing` when
    /// given. Returns the attachment reference and whether a new blob was
    /// created.
    pub async fn write(
        &self,
        existing: Option<&BlobRef>,
        parts: Parts,
        description: Option<String>,
    ) -> DbResult<(BlobRef, bool)> {
        if let Some(existing) = existing {
            match self.transport.update_blob(&existing.id, parts.clone()).await {
                Ok(blob) => {
                    debug!(id = %blob.id, files = blob.parts.len(), "updated attachment");
                    return Ok((blob.reference(), false));
                }
                Err(BlobError::NotFound(id)) => {
                    warn!(%id, "attachment blob vanished, creating a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let blob = self
            .transport
            .create_blob(NewBlob::new(parts).public(self.public).description(description))
            .await?;
        debug!(id = %blob.id, files = blob.parts.len(), "created attachment");
        Ok((blob.reference(), true))
    }

    /// Read an attachment's files.
    ///
    /// A blob that is missing or cannot be fetched reads as `None`.
    /// Contents that fail to decrypt are a [`DbError::Decode`].
    pub async fn read(&self, reference: &BlobRef) -> DbResult<Option<Files>> {
        let blob = match self.transport.read_blob(&reference.id).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(id = %reference.id, error = %e, "attachment read failed");
                return Ok(None);
            }
        };

        let mut files = Files::new();
        for (name, content) in blob.parts {
            let opened = self.codec.open(&content)?;
            files.insert(name, opened);
        }
        Ok(Some(files))
    }

    pub async fn delete(&self, reference: &BlobRef) -> DbResult<bool> {
        let removed = self.transport.delete_blob(&reference.id).await?;
        debug!(id = %reference.id, removed, "deleted attachment");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pastedb_codec::{Cipher, CompressionMode};
    use pastedb_store::InMemoryBlobStore;

    fn manager(store: Arc<InMemoryBlobStore>, codec: Codec) -> AttachmentManager {
        AttachmentManager::new(store, codec, ChunkLimits::new(64, 3), false)
    }

    fn files(pairs: &[(&str, &str)]) -> Files {
        pairs
            .iter()
            .map(|(n, c)| (n.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn prepare_rejects_bad_input() {
        let m = manager(Arc::new(InMemoryBlobStore::new()), Codec::default());
        assert!(matches!(m.prepare(&Files::new()), Err(DbError::Validation(_))));
        assert!(matches!(
            m.prepare(&files(&[("", "x")])),
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            m.prepare(&files(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")])),
            Err(DbError::SizeLimit(_))
        ));
        let big = "z".repeat(65);
        assert!(matches!(
            m.prepare(&files(&[("big", big.as_str())])),
            Err(DbError::SizeLimit(_))
        ));
    }

    #[tokio::test]
    async fn write_read_delete() {
        let store = Arc::new(InMemoryBlobStore::new());
        let m = manager(store.clone(), Codec::default());

        let parts = m.prepare(&files(&[("notes.txt", "hello")])).unwrap();
        let (reference, created) = m.write(None, parts, None).await.unwrap();
        assert!(created);
        assert!(store.contains(&reference.id));

        let read = m.read(&reference).await.unwrap().unwrap();
        assert_eq!(read, files(&[("notes.txt", "hello")]));

        assert!(m.delete(&reference).await.unwrap());
        assert!(m.read(&reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_files_in_place() {
        let store = Arc::new(InMemoryBlobStore::new());
        let m = manager(store.clone(), Codec::default());

        let first = m.prepare(&files(&[("a", "1"), ("b", "2")])).unwrap();
        let (reference, _) = m.write(None, first, None).await.unwrap();

        let second = m.prepare(&files(&[("c", "3")])).unwrap();
        let (updated, created) = m.write(Some(&reference), second, None).await.unwrap();
        assert!(!created);
        assert_eq!(updated.id, reference.id);
        assert_eq!(m.read(&updated).await.unwrap().unwrap(), files(&[("c", "3")]));
    }

    #[tokio::test]
    async fn write_recreates_missing_blob() {
        let store = Arc::new(InMemoryBlobStore::new());
        let m = manager(store.clone(), Codec::default());
        let gone = BlobRef::new("deadbeef", "memory://deadbeef");

        let parts = m.prepare(&files(&[("a", "1")])).unwrap();
        let (reference, created) = m.write(Some(&gone), parts, None).await.unwrap();
        assert!(created);
        assert_ne!(reference.id, gone.id);
    }

    #[tokio::test]
    async fn contents_are_encrypted_at_rest() {
        let store = Arc::new(InMemoryBlobStore::new());
        let codec = Codec::new(
            CompressionMode::Binary,
            Some(Cipher::from_passphrase("attach").unwrap()),
        );
        let m = AttachmentManager::new(store.clone(), codec, ChunkLimits::default(), false);

        let parts = m.prepare(&files(&[("secret.txt", "top secret")])).unwrap();
        let (reference, _) = m.write(None, parts, None).await.unwrap();

        let raw = store.read_blob(&reference.id).await.unwrap().unwrap();
        assert!(!raw.parts["secret.txt"].contains("top secret"));
        assert_eq!(
            m.read(&reference).await.unwrap().unwrap()["secret.txt"],
            "top secret"
        );

        let wrong = AttachmentManager::new(
            store,
            Codec::new(
                CompressionMode::Binary,
                Some(Cipher::from_passphrase("other").unwrap()),
            ),
            ChunkLimits::default(),
            false,
        );
        assert!(matches!(wrong.read(&reference).await, Err(DbError::Decode(_))));
    }
}
