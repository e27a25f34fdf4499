use std::path::Path;

use pastedb_codec::{Cipher, Codec, CompressionMode};
use pastedb_pack::{ChunkLimits, MAX_CHUNKS_PER_BLOB, MAX_CHUNK_BYTES};
use pastedb_types::BlobId;
use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

pub const ENV_ROOT_ID: &str = "PASTEDB_ROOT_ID";
pub const ENV_ENCRYPTION_KEY: &str = "PASTEDB_ENCRYPTION_KEY";
pub const ENV_COMPRESSION: &str = "PASTEDB_COMPRESSION";

/// Settings for opening a database.
///
/// Typically loaded from a TOML file and then overridden from the
/// environment:
///
/// ```toml
/// root_id = "3f2a9c..."
/// public = false
/// description = "my store"
/// compression = "binary"
/// max_chunk_bytes = 999999
/// max_chunks = 10
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Existing root blob to open. `None` creates a new database.
    pub root_id: Option<BlobId>,
    /// Visibility of blobs this database creates.
    pub public: bool,
    /// Description attached to the root blob on creation.
    pub description: Option<String>,
    pub compression: CompressionMode,
    /// Passphrase for at-rest encryption. Never written back out.
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
    pub max_chunk_bytes: usize,
    pub max_chunks: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            root_id: None,
            public: false,
            description: None,
            compression: CompressionMode::None,
            encryption_key: None,
            max_chunk_bytes: MAX_CHUNK_BYTES,
            max_chunks: MAX_CHUNKS_PER_BLOB,
        }
    }
}

impl DatabaseConfig {
    pub fn from_toml_str(text: &str) -> DbResult<Self> {
        toml::from_str(text).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> DbResult<String> {
        toml::to_string_pretty(self).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Override fields from `PASTEDB_*` environment variables.
    pub fn apply_env(self) -> DbResult<Self> {
        self.apply_vars(std::env::vars())
    }

    /// Override fields from an explicit set of variables.
    pub fn apply_vars<I, K, V>(mut self, vars: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in vars {
            match name.as_ref() {
                ENV_ROOT_ID => self.root_id = Some(BlobId::new(value.into())),
                ENV_ENCRYPTION_KEY => self.encryption_key = Some(value.into()),
                ENV_COMPRESSION => self.compression = value.into().parse()?,
                _ => {}
            }
        }
        Ok(self)
    }

    pub fn with_root(mut self, root_id: impl Into<BlobId>) -> Self {
        self.root_id = Some(root_id.into());
        self
    }

    pub fn with_compression(mut self, compression: CompressionMode) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    pub fn with_limits(mut self, limits: ChunkLimits) -> Self {
        self.max_chunk_bytes = limits.max_chunk_bytes;
        self.max_chunks = limits.max_chunks;
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> DbResult<()> {
        if self.max_chunk_bytes == 0 || self.max_chunks == 0 {
            return Err(DbError::Config("chunk limits must be non-zero".into()));
        }
        if matches!(&self.encryption_key, Some(k) if k.is_empty()) {
            return Err(DbError::Config("encryption key is empty".into()));
        }
        if matches!(&self.root_id, Some(id) if id.as_str().is_empty()) {
            return Err(DbError::Config("root id is empty".into()));
        }
        Ok(())
    }

    pub fn limits(&self) -> ChunkLimits {
        ChunkLimits::new(self.max_chunk_bytes, self.max_chunks)
    }

    /// Build the codec this configuration selects.
    pub fn codec(&self) -> DbResult<Codec> {
        let cipher = self
            .encryption_key
            .as_deref()
            .map(Cipher::from_passphrase)
            .transpose()?;
        Ok(Codec::new(self.compression, cipher))
    }
}
