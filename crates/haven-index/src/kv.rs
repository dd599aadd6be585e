//! Ordered key-value collaborator contract.

use async_trait::async_trait;
use futures::stream::BoxStream;
use haven_core::StorageError;
use thiserror::Error;

/// Result alias for key-value operations.
pub type KvResult<T> = Result<T, KvError>;

/// Errors from the ordered key-value collaborator.
#[derive(Debug, Error)]
pub enum KvError {
    /// A read failed inside the store.
    #[error("kv read failed: {0}")]
    Read(String),

    /// A write failed inside the store.
    #[error("kv write failed: {0}")]
    Write(String),

    /// A stored value could not be encoded or decoded.
    #[error("kv codec failed: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<KvError> for StorageError {
    fn from(err: KvError) -> Self {
        StorageError::Index(err.to_string())
    }
}

/// A scan range over string keys, exclusive on both bounds.
///
/// `lt: None` means unbounded above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Keys must be strictly greater than this.
    pub gt: String,
    /// Keys must be strictly less than this, when set.
    pub lt: Option<String>,
}

impl KeyRange {
    /// True when `key` falls inside the range.
    pub fn contains(&self, key: &str) -> bool {
        key > self.gt.as_str() && self.lt.as_deref().map_or(true, |lt| key < lt)
    }
}

/// The ordered key-value store this engine runs against.
///
/// Scans yield keys in ascending lexicographic order. Dropping the
/// returned stream cancels the scan; cancellation is cooperative and has
/// no side effects, scans being read-only.
#[async_trait]
pub trait OrderedKv: Send + Sync {
    /// Point read; an absent key is `None`, not an error.
    async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;

    /// Idempotent point write.
    async fn put(&self, key: &str, value: Vec<u8>) -> KvResult<()>;

    /// Idempotent point delete; deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> KvResult<()>;

    /// Atomic multi-key delete.
    async fn delete_batch(&self, keys: &[String]) -> KvResult<()>;

    /// Range scan, ascending, exclusive on both bounds.
    fn scan(&self, range: KeyRange) -> BoxStream<'_, KvResult<(String, Vec<u8>)>>;
}
