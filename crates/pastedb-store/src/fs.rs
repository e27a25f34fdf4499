use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pastedb_types::BlobId;
use tracing::{debug, warn};

use crate::blob::{generate_blob_id, Blob, BlobLimits, NewBlob, Parts};
use crate::error::{BlobError, BlobResult};
use crate::traits::BlobTransport;

const HEADER_SIZE: usize = 8;
const BLOB_EXTENSION: &str = "blob";

/// Filesystem-backed blob store: one file per blob under `root`.
///
/// On-disk format of `<root>/<id>.blob`:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized Blob)]
/// ```
/// Writes go to a temporary sibling file that is renamed into place, so a
/// reader never observes a half-written blob.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    limits: BlobLimits,
}

impl FsBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> BlobResult<Self> {
        Self::open_with_limits(root, BlobLimits::unlimited()).await
    }

    pub async fn open_with_limits(root: impl AsRef<Path>, limits: BlobLimits) -> BlobResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "opened filesystem blob store");
        Ok(Self { root, limits })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `id`, or `None` if the id cannot name a file
    /// inside the root.
    fn blob_path(&self, id: &BlobId) -> Option<PathBuf> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.root.join(format!("{}.{BLOB_EXTENSION}", id.as_str())))
    }

    fn url_for(path: &Path) -> String {
        format!("file://{}", path.display())
    }

    async fn write_file(&self, path: &Path, blob: &Blob) -> BlobResult<()> {
        let payload = bincode::serialize(blob).map_err(|e| BlobError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| BlobError::Serialization(format!("blob {} too large", blob.id)))?;
        let crc = crc32fast::hash(&payload);

        let mut framed = Vec::with_capacity(HEADER_SIZE + payload.len());
        framed.extend_from_slice(&length.to_le_bytes());
        framed.extend_from_slice(&crc.to_le_bytes());
        framed.extend_from_slice(&payload);

        let tmp = path.with_extension(format!("{BLOB_EXTENSION}.tmp"));
        tokio::fs::write(&tmp, &framed).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(id = %blob.id, len = payload.len(), "wrote blob file");
        Ok(())
    }

    async fn read_file(&self, id: &BlobId, path: &Path) -> BlobResult<Option<Blob>> {
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let corrupt = |reason: String| BlobError::Corrupt {
            id: id.clone(),
            reason,
        };

        if data.len() < HEADER_SIZE {
            return Err(corrupt(format!("file is {} bytes, shorter than header", data.len())));
        }
        let length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let expected_crc = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let payload = &data[HEADER_SIZE..];
        if payload.len() != length {
            return Err(corrupt(format!(
                "header says {length} bytes, found {}",
                payload.len()
            )));
        }

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(%id, expected = expected_crc, actual = actual_crc, "CRC mismatch on blob file");
            return Err(corrupt("CRC mismatch".into()));
        }

        let blob = bincode::deserialize(payload).map_err(|e| corrupt(e.to_string()))?;
        Ok(Some(blob))
    }
}

#[async_trait]
impl BlobTransport for FsBlobStore {
    async fn create_blob(&self, blob: NewBlob) -> BlobResult<Blob> {
        self.limits.check(&blob.parts)?;

        let id = generate_blob_id();
        let path = self
            .blob_path(&id)
            .ok_or_else(|| BlobError::Backend(format!("generated unusable id {id}")))?;
        let stored = Blob {
            url: Self::url_for(&path),
            id,
            description: blob.description,
            public: blob.public,
            parts: blob.parts,
        };
        self.write_file(&path, &stored).await?;
        Ok(stored)
    }

    async fn read_blob(&self, id: &BlobId) -> BlobResult<Option<Blob>> {
        match self.blob_path(id) {
            Some(path) => self.read_file(id, &path).await,
            None => Ok(None),
        }
    }

    async fn update_blob(&self, id: &BlobId, parts: Parts) -> BlobResult<Blob> {
        self.limits.check(&parts)?;

        let path = self
            .blob_path(id)
            .ok_or_else(|| BlobError::NotFound(id.clone()))?;
        let mut blob = self
            .read_file(id, &path)
            .await?
            .ok_or_else(|| BlobError::NotFound(id.clone()))?;
        blob.parts = parts;
        self.write_file(&path, &blob).await?;
        Ok(blob)
    }

    async fn delete_blob(&self, id: &BlobId) -> BlobResult<bool> {
        let Some(path) = self.blob_path(id) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn blob_exists(&self, id: &BlobId) -> BlobResult<bool> {
        match self.blob_path(id) {
            Some(path) => Ok(tokio::fs::try_exists(&path).await?),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(entries: &[(&str, &str)]) -> Parts {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        let blob = store
            .create_blob(NewBlob::new(parts(&[("k_0.json", "{\"value\":{}}")])).public(true))
            .await
            .unwrap();
        assert!(blob.url.starts_with("file://"));

        // A second handle on the same directory sees the blob.
        let reopened = FsBlobStore::open(dir.path()).await.unwrap();
        let read = reopened.read_blob(&blob.id).await.unwrap().unwrap();
        assert_eq!(read, blob);
        assert!(reopened.blob_exists(&blob.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let blob = store
            .create_blob(NewBlob::new(parts(&[("a", "1")])))
            .await
            .unwrap();

        let updated = store
            .update_blob(&blob.id, parts(&[("b", "2")]))
            .await
            .unwrap();
        assert_eq!(updated.parts, parts(&[("b", "2")]));
        assert_eq!(updated.url, blob.url);

        assert!(store.delete_blob(&blob.id).await.unwrap());
        assert!(!store.delete_blob(&blob.id).await.unwrap());
        assert!(store.read_blob(&blob.id).await.unwrap().is_none());
        assert!(matches!(
            store.update_blob(&blob.id, Parts::new()).await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn hostile_ids_never_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let id = BlobId::new("../../etc/passwd");
        assert!(store.read_blob(&id).await.unwrap().is_none());
        assert!(!store.delete_blob(&id).await.unwrap());
        assert!(!store.blob_exists(&id).await.unwrap());
    }

    #[tokio::test]
    async fn crc_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let blob = store
            .create_blob(NewBlob::new(parts(&[("a", "payload")])))
            .await
            .unwrap();

        let path = store.blob_path(&blob.id).unwrap();
        let mut data = std::fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        std::fs::write(&path, data).unwrap();

        let err = store.read_blob(&blob.id).await.unwrap_err();
        assert!(matches!(err, BlobError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn truncated_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let blob = store.create_blob(NewBlob::default()).await.unwrap();
        let path = store.blob_path(&blob.id).unwrap();
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        assert!(matches!(
            store.read_blob(&blob.id).await,
            Err(BlobError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn limits_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open_with_limits(dir.path(), BlobLimits::new(2, 5))
            .await
            .unwrap();
        let err = store
            .create_blob(NewBlob::new(parts(&[("a", "xyz")])))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::PartTooLarge { .. }));
    }
}
