//! The [`PasteDb`] handle: keyed documents on top of a blob transport.

use std::sync::Arc;

use futures::future::join_all;
use pastedb_codec::Codec;
use pastedb_index::RootIndex;
use pastedb_pack::{pack, unpack, ChunkLimits};
use pastedb_store::{Blob, BlobError, BlobTransport, NewBlob, Parts};
use pastedb_types::{into_object, now_ms, BlobRef, DocRef, DocumentRecord, Key, Revision, Ttl};
use tracing::{debug, info, warn};

use crate::attachment::AttachmentManager;
use crate::config::DatabaseConfig;
use crate::document::{Document, SetOptions};
use crate::error::{DbError, DbResult};

/// Outcome of [`PasteDb::destroy`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DestroyReport {
    pub documents_removed: usize,
    /// Documents whose blobs could not be deleted. Their failures were
    /// logged and otherwise ignored.
    pub failures: usize,
}

/// An open database.
///
/// Every call re-reads the root index from the transport; the handle holds
/// no cached state besides the root reference. Concurrent writers against
/// the same root race on the index and the last writer wins.
pub struct PasteDb {
    transport: Arc<dyn BlobTransport>,
    codec: Codec,
    limits: ChunkLimits,
    public: bool,
    root: BlobRef,
    is_new: bool,
    attachments: AttachmentManager,
}

impl PasteDb {
    /// Open the database described by `config`.
    ///
    /// Without a `root_id` a fresh root blob holding an empty index is
    /// created. With one, the root must exist and its index must decode
    /// under the configured codec.
    pub async fn init(config: DatabaseConfig, transport: Arc<dyn BlobTransport>) -> DbResult<Self> {
        config.validate()?;
        let codec = config.codec()?;
        let limits = config.limits();

        let (root, is_new) = match &config.root_id {
            None => {
                let parts = RootIndex::new().to_parts(&codec)?;
                let blob = transport
                    .create_blob(
                        NewBlob::new(parts)
                            .public(config.public)
                            .description(config.description.clone()),
                    )
                    .await?;
                info!(root = %blob.id, "created database");
                (blob.reference(), true)
            }
            Some(id) => {
                let blob = transport
                    .read_blob(id)
                    .await?
                    .ok_or_else(|| DbError::RootNotFound(id.clone()))?;
                let index = RootIndex::from_parts(&blob.parts, &codec)?;
                info!(root = %blob.id, keys = index.len(), "opened database");
                (blob.reference(), false)
            }
        };

        let attachments =
            AttachmentManager::new(transport.clone(), codec.clone(), limits, config.public);

        Ok(Self {
            transport,
            codec,
            limits,
            public: config.public,
            root,
            is_new,
            attachments,
        })
    }

    /// The root blob. Its id is what reopens this database.
    pub fn root(&self) -> &BlobRef {
        &self.root
    }

    /// `true` if [`PasteDb::init`] created the root blob.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn limits(&self) -> ChunkLimits {
        self.limits
    }

    /// Fetch a document. Expired documents are evicted and read as `None`.
    pub async fn get(&self, key: impl Into<Key>) -> DbResult<Option<Document>> {
        self.fetch(key.into(), None).await
    }

    /// Like [`PasteDb::get`], but fails with [`DbError::RevisionConflict`]
    /// unless the stored revision is `expected`.
    pub async fn get_at_revision(
        &self,
        key: impl Into<Key>,
        expected: &Revision,
    ) -> DbResult<Option<Document>> {
        self.fetch(key.into(), Some(expected)).await
    }

    /// Fetch several documents concurrently. Each key succeeds or fails on
    /// its own.
    pub async fn get_many<I, K>(&self, keys: I) -> Vec<DbResult<Option<Document>>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        join_all(keys.into_iter().map(|k| self.get(k))).await
    }

    pub async fn has(&self, key: impl Into<Key>) -> DbResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Keys currently in the index whose TTL has not run out.
    pub async fn keys(&self) -> DbResult<Vec<Key>> {
        let now = now_ms();
        let index = self.load_index().await?;
        Ok(index
            .iter()
            .filter(|(_, r)| !r.ttl.is_expired_at(now))
            .map(|(k, _)| k.clone())
            .collect())
    }

    /// Write a document.
    ///
    /// Validation and size checks run before anything reaches the
    /// transport. When `opts.rev` is given it must match the stored
    /// revision; on a key with no stored document it becomes the initial
    /// revision instead.
    pub async fn set(&self, key: impl Into<Key>, opts: SetOptions) -> DbResult<Document> {
        let key = key.into();
        key.validate()?;
        let value = into_object(opts.value)?;
        let attachment_parts = opts
            .files
            .as_ref()
            .map(|files| self.attachments.prepare(files))
            .transpose()?;

        let ttl = Ttl::starting_now(opts.ttl);
        let sizing = DocumentRecord {
            value,
            ttl,
            rev: Revision::generate(),
            extra_file: attachment_parts.is_some().then(placeholder_attachment),
        };
        self.pack_record(&key, &sizing)?;
        let value = sizing.value;

        let mut index = self.load_index().await?;
        let mut existing = index.get(&key).cloned();
        if let Some(doc_ref) = existing.take_if(|r| r.ttl.is_expired()) {
            debug!(%key, "replacing expired document");
            index = self.remove_entry(index, &key, &doc_ref).await?;
        }

        let current = match &existing {
            Some(doc_ref) => match self.read_record(&key, doc_ref).await {
                Ok(record) => record,
                Err(e) if opts.rev.is_none() => {
                    warn!(%key, error = %e, "overwriting unreadable document");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        if let (Some(expected), Some(record)) = (&opts.rev, &current) {
            if *expected != record.rev {
                return Err(DbError::RevisionConflict {
                    key,
                    expected: expected.clone(),
                    actual: record.rev.clone(),
                });
            }
        }
        let rev = match (&current, opts.rev) {
            (None, Some(initial)) => initial,
            _ => Revision::generate(),
        };

        // The record is packed with its final attachment reference before
        // the attachment blob is touched, so an oversize record leaves the
        // stored attachment as it was.
        let current_attachment = current.and_then(|r| r.extra_file);
        let mut record = DocumentRecord {
            value,
            ttl,
            rev,
            extra_file: current_attachment
                .clone()
                .or_else(|| attachment_parts.is_some().then(placeholder_attachment)),
        };
        let mut chunks = self.pack_record(&key, &record)?;

        let mut created_attachment = None;
        if let Some(parts) = attachment_parts {
            let (reference, created) = self
                .attachments
                .write(current_attachment.as_ref(), parts, opts.description.clone())
                .await?;
            if created {
                created_attachment = Some(reference.clone());
            }
            if record.extra_file.as_ref() != Some(&reference) {
                record.extra_file = Some(reference);
                chunks = match self.pack_record(&key, &record) {
                    Ok(chunks) => chunks,
                    Err(e) => {
                        self.discard_attachment(created_attachment.as_ref()).await;
                        return Err(e);
                    }
                };
            }
        }

        let written = match self
            .write_record(&key, chunks, existing.as_ref(), opts.description)
            .await
        {
            Ok(written) => written,
            Err(e) => {
                self.discard_attachment(created_attachment.as_ref()).await;
                return Err(e);
            }
        };
        let (blob, created) = written;

        let index_changed = match &existing {
            None => true,
            Some(old) => old.id != blob.id || old.ttl.ttl.is_some() || ttl.ttl.is_some(),
        };
        if index_changed {
            let updated = index.with(key.clone(), DocRef::new(blob.id.clone(), ttl));
            if let Err(e) = self.store_index(&updated).await {
                if created {
                    self.discard_blob(&blob.reference()).await;
                }
                self.discard_attachment(created_attachment.as_ref()).await;
                return Err(e);
            }
        }

        debug!(%key, id = %blob.id, rev = %record.rev, chunks = blob.parts.len(), "stored document");
        Ok(Document {
            key,
            id: blob.id,
            url: blob.url,
            value: record.value,
            rev: record.rev,
            ttl: record.ttl,
            attachment: record.extra_file,
            files: opts.files,
        })
    }

    /// Delete a document and its attachment. Returns `false` if the key
    /// was not present.
    pub async fn delete(&self, key: impl Into<Key>) -> DbResult<bool> {
        let key = key.into();
        key.validate()?;
        let index = self.load_index().await?;
        let Some(doc_ref) = index.get(&key).cloned() else {
            return Ok(false);
        };
        self.remove_entry(index, &key, &doc_ref).await?;
        debug!(%key, "deleted document");
        Ok(true)
    }

    /// Delete several keys, one after another so that no deletion loses
    /// another's index update. Each key succeeds or fails on its own.
    pub async fn delete_many<I, K>(&self, keys: I) -> Vec<DbResult<bool>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let mut results = Vec::new();
        for key in keys {
            results.push(self.delete(key).await);
        }
        results
    }

    /// Evict every document whose index TTL has run out, writing the index
    /// once. Returns the evicted keys.
    pub async fn purge_expired(&self) -> DbResult<Vec<Key>> {
        let index = self.load_index().await?;
        let expired = index.expired_keys(now_ms());
        if expired.is_empty() {
            return Ok(expired);
        }

        let mut remaining = index.clone();
        for key in &expired {
            if let Some(doc_ref) = index.get(key) {
                self.remove_blobs(key, doc_ref).await?;
                remaining = remaining.without(key);
            }
        }
        self.store_index(&remaining).await?;
        info!(evicted = expired.len(), "purged expired documents");
        Ok(expired)
    }

    /// Delete every document blob, then the root blob.
    ///
    /// Failures on individual documents are logged and counted but do not
    /// stop the rest. Failing to delete the root itself is an error.
    pub async fn destroy(self) -> DbResult<DestroyReport> {
        let index = self.load_index().await?;
        let this = &self;
        let outcomes = join_all(
            index
                .iter()
                .map(|(key, doc_ref)| async move { (key, this.remove_blobs(key, doc_ref).await) }),
        )
        .await;

        let mut report = DestroyReport::default();
        for (key, outcome) in outcomes {
            match outcome {
                Ok(()) => report.documents_removed += 1,
                Err(e) => {
                    warn!(%key, error = %e, "failed to delete document during destroy");
                    report.failures += 1;
                }
            }
        }

        self.transport.delete_blob(&self.root.id).await?;
        info!(
            root = %self.root.id,
            removed = report.documents_removed,
            failures = report.failures,
            "destroyed database"
        );
        Ok(report)
    }

    async fn fetch(&self, key: Key, expected: Option<&Revision>) -> DbResult<Option<Document>> {
        key.validate()?;
        let index = self.load_index().await?;
        let Some(doc_ref) = index.get(&key).cloned() else {
            return Ok(None);
        };

        if doc_ref.ttl.is_expired() {
            debug!(%key, "evicting expired document");
            self.remove_entry(index, &key, &doc_ref).await?;
            return Ok(None);
        }

        let Some((blob, record)) = self.read_blob_record(&key, &doc_ref).await? else {
            return Ok(None);
        };

        // The record carries its own TTL in case the index entry is stale.
        if record.ttl.is_expired() {
            debug!(%key, "evicting document expired by its own ttl");
            self.remove_entry(index, &key, &doc_ref).await?;
            return Ok(None);
        }

        if let Some(expected) = expected {
            if *expected != record.rev {
                return Err(DbError::RevisionConflict {
                    key,
                    expected: expected.clone(),
                    actual: record.rev,
                });
            }
        }

        let files = match &record.extra_file {
            Some(reference) => self.attachments.read(reference).await?,
            None => None,
        };

        Ok(Some(Document {
            key,
            id: blob.id,
            url: blob.url,
            value: record.value,
            rev: record.rev,
            ttl: record.ttl,
            attachment: record.extra_file,
            files,
        }))
    }

    async fn load_index(&self) -> DbResult<RootIndex> {
        let blob = self
            .transport
            .read_blob(&self.root.id)
            .await?
            .ok_or_else(|| DbError::RootNotFound(self.root.id.clone()))?;
        Ok(RootIndex::from_parts(&blob.parts, &self.codec)?)
    }

    async fn store_index(&self, index: &RootIndex) -> DbResult<()> {
        let parts = index.to_parts(&self.codec)?;
        if let Some(size) = parts
            .values()
            .map(String::len)
            .find(|len| *len > self.limits.max_chunk_bytes)
        {
            return Err(DbError::SizeLimit(format!(
                "root index too large: {size} bytes (limit {})",
                self.limits.max_chunk_bytes
            )));
        }
        self.transport.update_blob(&self.root.id, parts).await?;
        debug!(keys = index.len(), "stored root index");
        Ok(())
    }

    /// Read and decode a document's blob.
    ///
    /// A blob the transport cannot deliver reads as `None`; content that
    /// does not decode is an error.
    async fn read_blob_record(
        &self,
        key: &Key,
        doc_ref: &DocRef,
    ) -> DbResult<Option<(Blob, DocumentRecord)>> {
        let blob = match self.transport.read_blob(&doc_ref.id).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                warn!(%key, id = %doc_ref.id, "document blob missing");
                return Ok(None);
            }
            Err(e) => {
                warn!(%key, id = %doc_ref.id, error = %e, "document read failed");
                return Ok(None);
            }
        };
        let Some(map) = unpack(&blob.parts, &self.codec)? else {
            warn!(%key, id = %doc_ref.id, "document blob holds no chunks");
            return Ok(None);
        };
        let record = DocumentRecord::from_map(map)?;
        Ok(Some((blob, record)))
    }

    async fn read_record(&self, key: &Key, doc_ref: &DocRef) -> DbResult<Option<DocumentRecord>> {
        Ok(self
            .read_blob_record(key, doc_ref)
            .await?
            .map(|(_, record)| record))
    }

    fn pack_record(&self, key: &Key, record: &DocumentRecord) -> DbResult<Parts> {
        Ok(pack(key, &record.to_map()?, &self.codec, &self.limits)?)
    }

    async fn write_record(
        &self,
        key: &Key,
        chunks: Parts,
        existing: Option<&DocRef>,
        description: Option<String>,
    ) -> DbResult<(Blob, bool)> {
        if let Some(doc_ref) = existing {
            match self.transport.update_blob(&doc_ref.id, chunks.clone()).await {
                Ok(blob) => return Ok((blob, false)),
                Err(BlobError::NotFound(id)) => {
                    warn!(%key, %id, "document blob vanished, creating a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let blob = self
            .transport
            .create_blob(NewBlob::new(chunks).public(self.public).description(description))
            .await?;
        Ok((blob, true))
    }

    /// Delete a document's attachment and blob, then drop its index entry.
    async fn remove_entry(&self, index: RootIndex, key: &Key, doc_ref: &DocRef) -> DbResult<RootIndex> {
        self.remove_blobs(key, doc_ref).await?;
        let updated = index.without(key);
        self.store_index(&updated).await?;
        Ok(updated)
    }

    async fn remove_blobs(&self, key: &Key, doc_ref: &DocRef) -> DbResult<()> {
        let attachment = match self.read_record(key, doc_ref).await {
            Ok(record) => record.and_then(|r| r.extra_file),
            Err(e) => {
                warn!(%key, error = %e, "cannot read document to find its attachment");
                None
            }
        };
        if let Some(reference) = attachment {
            self.attachments.delete(&reference).await?;
        }
        self.transport.delete_blob(&doc_ref.id).await?;
        Ok(())
    }

    async fn discard_blob(&self, reference: &BlobRef) {
        if let Err(e) = self.transport.delete_blob(&reference.id).await {
            warn!(id = %reference.id, error = %e, "failed to clean up blob");
        }
    }

    async fn discard_attachment(&self, reference: Option<&BlobRef>) {
        if let Some(reference) = reference {
            self.discard_blob(reference).await;
        }
    }
}

/// Stands in for an attachment blob that does not exist yet when sizing a
/// record. A longer real reference is packed again once the blob exists.
fn placeholder_attachment() -> BlobRef {
    BlobRef::new("0".repeat(40), format!("placeholder://{}", "0".repeat(112)))
}
