/// Largest text part the host service accepts, in bytes.
pub const MAX_CHUNK_BYTES: usize = 999_999;

/// Most parts the host service accepts in one blob.
pub const MAX_CHUNKS_PER_BLOB: usize = 10;

/// Bounds applied when fragmenting a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLimits {
    pub max_chunk_bytes: usize,
    pub max_chunks: usize,
}

impl ChunkLimits {
    pub fn new(max_chunk_bytes: usize, max_chunks: usize) -> Self {
        Self {
            max_chunk_bytes,
            max_chunks,
        }
    }

    /// Total bytes a fully used blob can carry.
    pub fn capacity(&self) -> usize {
        self.max_chunk_bytes.saturating_mul(self.max_chunks)
    }
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self::new(MAX_CHUNK_BYTES, MAX_CHUNKS_PER_BLOB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let limits = ChunkLimits::default();
        assert_eq!(limits.max_chunk_bytes, 999_999);
        assert_eq!(limits.max_chunks, 10);
        assert_eq!(limits.capacity(), 9_999_990);
    }

    #[test]
    fn capacity_saturates() {
        assert_eq!(ChunkLimits::new(usize::MAX, 2).capacity(), usize::MAX);
    }
}
