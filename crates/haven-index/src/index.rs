//! Metadata index over the ordered key-value store.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::debug;

use haven_core::{FileInfo, FileList, FileListAdvance};

use crate::keys::KeySpace;
use crate::kv::{KvResult, OrderedKv};

/// Scan positions per page.
///
/// The page window is inclusive on both ends, so a full page carries
/// `PAGE_SIZE + 1` entries; this is preserved, documented behavior.
pub const PAGE_SIZE: usize = 100;

/// Metadata records keyed by logical path.
///
/// Holds an explicit handle to the ordered store; nothing here reaches
/// through ambient state.
#[derive(Clone)]
pub struct MetadataIndex {
    kv: Arc<dyn OrderedKv>,
    keys: KeySpace,
}

impl MetadataIndex {
    /// Single-tenant index over `kv`.
    pub fn new(kv: Arc<dyn OrderedKv>) -> Self {
        Self {
            kv,
            keys: KeySpace::new(),
        }
    }

    /// Namespaced index over `kv`, for multi-tenant keyspaces.
    pub fn with_namespace(kv: Arc<dyn OrderedKv>, namespace: &str) -> Self {
        Self {
            kv,
            keys: KeySpace::namespaced(namespace),
        }
    }

    /// Fetch the record at `path`. Absent is not an error.
    pub async fn file_info(&self, path: &str) -> KvResult<Option<FileInfo>> {
        match self.kv.get(&self.keys.file(path)).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Idempotent overwrite of the record at `path`.
    pub async fn set_file_info(&self, path: &str, info: &FileInfo) -> KvResult<()> {
        let raw = serde_json::to_vec(info)?;
        self.kv.put(&self.keys.file(path), raw).await?;
        debug!(path, size = info.size, "stored file info");
        Ok(())
    }

    /// Idempotent delete of the record at `path`.
    pub async fn delete_file_info(&self, path: &str) -> KvResult<()> {
        self.kv.delete(&self.keys.file(path)).await
    }

    /// Delete every record whose key strictly extends `path`, in one
    /// atomic batch.
    ///
    /// The scan covers the exclusive range up to the incremented-prefix
    /// bound. To delete a directory subtree without touching a sibling
    /// that shares the string prefix, pass the path with its trailing
    /// separator (`/u1/`, whose bound is the adjacent `/u10`).
    pub async fn delete_subtree(&self, path: &str) -> KvResult<()> {
        let mut keys = Vec::new();
        {
            let mut scan = self.kv.scan(self.keys.file_subtree(path));
            while let Some(entry) = scan.next().await {
                let (key, _) = entry?;
                keys.push(key);
            }
        }
        debug!(path, count = keys.len(), "deleting metadata subtree");
        self.kv.delete_batch(&keys).await
    }

    /// One page of key suffixes under `path`.
    pub async fn list(&self, path: &str, page: u32) -> KvResult<FileList> {
        let start = self.keys.file(path);
        let scan = self.kv.scan(self.keys.file_subtree(path));
        let (entries, next) = paginate(scan, page, |key, _| Ok(suffix(&start, &key))).await?;
        Ok(FileList {
            entries,
            page: next,
        })
    }

    /// One page of key suffixes with their metadata records under `path`.
    pub async fn list_with_info(&self, path: &str, page: u32) -> KvResult<FileListAdvance> {
        let start = self.keys.file(path);
        let scan = self.kv.scan(self.keys.file_subtree(path));
        let (entries, next) = paginate(scan, page, |key, value| {
            let info: FileInfo = serde_json::from_slice(&value)?;
            Ok((suffix(&start, &key), info))
        })
        .await?;
        Ok(FileListAdvance {
            entries: entries.into_iter().collect(),
            page: next,
        })
    }
}

fn suffix(start: &str, key: &str) -> String {
    key.strip_prefix(start).unwrap_or(key).to_string()
}

/// Windowed pagination over a key scan.
///
/// Scan positions are 0-based; page `p` keeps positions in
/// `[p * PAGE_SIZE, (p + 1) * PAGE_SIZE]`, inclusive on both ends.
/// Positions before the window are counted but skipped. The first
/// position past the window both sets the continuation page and ends the
/// scan: the stream is dropped right there, which cancels the underlying
/// range scan.
async fn paginate<S, T, F>(mut scan: S, page: u32, mut map: F) -> KvResult<(Vec<T>, Option<u32>)>
where
    S: Stream<Item = KvResult<(String, Vec<u8>)>> + Unpin,
    F: FnMut(String, Vec<u8>) -> KvResult<T>,
{
    let first = page as usize * PAGE_SIZE;
    let last = (page as usize + 1) * PAGE_SIZE;

    let mut collected = Vec::new();
    let mut next = None;
    let mut position = 0usize;
    while let Some(entry) = scan.next().await {
        let (key, value) = entry?;
        if position < first {
            // Before the window: counted, not collected.
        } else if position <= last {
            collected.push(map(key, value)?);
        } else {
            next = Some(page + 1);
            break;
        }
        position += 1;
    }
    Ok((collected, next))
}
