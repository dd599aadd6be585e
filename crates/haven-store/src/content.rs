//! Durable content storage under the filesystem root.

use std::io;
use std::path::Path;

use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use haven_core::StorageError;

/// Where the bytes of a write come from: an already-buffered body, or the
/// incoming transfer streamed straight to the destination file. Never
/// both.
pub enum ContentSource {
    /// A fully buffered body.
    Bytes(Vec<u8>),
    /// The incoming transfer, streamed to the destination.
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl ContentSource {
    /// Length when the body is buffered; unknown for streams.
    pub fn buffered_len(&self) -> Option<u64> {
        match self {
            ContentSource::Bytes(bytes) => Some(bytes.len() as u64),
            ContentSource::Stream(_) => None,
        }
    }
}

impl From<Vec<u8>> for ContentSource {
    fn from(bytes: Vec<u8>) -> Self {
        ContentSource::Bytes(bytes)
    }
}

impl From<&[u8]> for ContentSource {
    fn from(bytes: &[u8]) -> Self {
        ContentSource::Bytes(bytes.to_vec())
    }
}

/// Files on disk, addressed by authorized absolute paths.
#[derive(Debug, Clone, Default)]
pub struct ContentStore;

impl ContentStore {
    /// Write `source` to `path`, creating parent directories as needed and
    /// restricting the file to owner read/write. Returns the stored size.
    pub async fn write(&self, path: &Path, source: ContentSource) -> Result<u64, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(path).await?;
        match source {
            ContentSource::Bytes(bytes) => file.write_all(&bytes).await?,
            ContentSource::Stream(mut reader) => {
                tokio::io::copy(&mut reader, &mut file).await?;
            }
        }
        file.flush().await?;
        drop(file);

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, Permissions::from_mode(0o600)).await?;
        }

        let size = fs::metadata(path).await?.len();
        debug!(path = %path.display(), size, "stored content");
        Ok(size)
    }

    /// Open `path` for reading.
    pub async fn read(&self, path: &Path) -> Result<fs::File, StorageError> {
        fs::File::open(path)
            .await
            .map_err(|err| not_found_or_io(err, path))
    }

    /// Remove the file at `path`.
    pub async fn remove(&self, path: &Path) -> Result<(), StorageError> {
        fs::remove_file(path)
            .await
            .map_err(|err| not_found_or_io(err, path))
    }

    /// Walk upward from `path`'s immediate parent to (but not including)
    /// `stop_at`, removing each now-empty directory, stopping at the first
    /// non-empty ancestor.
    ///
    /// A concurrent write can repopulate a directory between the emptiness
    /// check and the removal; that race is tolerated and the walk just
    /// stops.
    pub async fn clean_ancestors(&self, path: &Path, stop_at: &Path) -> Result<(), StorageError> {
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == stop_at || !current.starts_with(stop_at) {
                break;
            }
            if !is_empty_dir(current).await? {
                break;
            }
            if let Err(err) = fs::remove_dir(current).await {
                warn!(dir = %current.display(), %err, "stopping ancestor cleanup");
                break;
            }
            debug!(dir = %current.display(), "removed empty directory");
            dir = current.parent();
        }
        Ok(())
    }
}

async fn is_empty_dir(path: &Path) -> Result<bool, StorageError> {
    let mut entries = fs::read_dir(path).await?;
    Ok(entries.next_entry().await?.is_none())
}

fn not_found_or_io(err: io::Error, path: &Path) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(format!("could not find file {}", path.display()))
    } else {
        StorageError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn buffered_writes_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ContentStore::default();
        let path = dir.path().join("u1/docs/a.txt");

        let size = store
            .write(&path, ContentSource::from(b"hello haven".as_slice()))
            .await
            .expect("write");
        assert_eq!(size, 11);

        let mut contents = Vec::new();
        store
            .read(&path)
            .await
            .expect("open")
            .read_to_end(&mut contents)
            .await
            .expect("read");
        assert_eq!(contents, b"hello haven");
    }

    #[tokio::test]
    async fn streamed_writes_reach_the_same_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ContentStore::default();
        let path = dir.path().join("u1/stream.bin");

        let body: &[u8] = b"streamed body";
        let size = store
            .write(&path, ContentSource::Stream(Box::new(body)))
            .await
            .expect("write");
        assert_eq!(size, body.len() as u64);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stored_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let store = ContentStore::default();
        let path = dir.path().join("u1/secret.txt");
        store
            .write(&path, ContentSource::from(b"s".as_slice()))
            .await
            .expect("write");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn reading_or_removing_an_absent_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ContentStore::default();
        let path = dir.path().join("u1/missing.txt");

        assert!(matches!(
            store.read(&path).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.remove(&path).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn ancestor_cleanup_stops_at_the_first_non_empty_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ContentStore::default();
        let user_root = dir.path().join("u1");

        let nested = user_root.join("a/b/only.txt");
        let sibling = user_root.join("keep.txt");
        store
            .write(&nested, ContentSource::from(b"x".as_slice()))
            .await
            .expect("write");
        store
            .write(&sibling, ContentSource::from(b"y".as_slice()))
            .await
            .expect("write");

        store.remove(&nested).await.expect("remove");
        store
            .clean_ancestors(&nested, &user_root)
            .await
            .expect("cleanup");

        assert!(!user_root.join("a/b").exists());
        assert!(!user_root.join("a").exists());
        // The user root itself is never removed.
        assert!(user_root.exists());
        assert!(sibling.exists());
    }

    #[tokio::test]
    async fn ancestor_cleanup_leaves_populated_directories_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ContentStore::default();
        let user_root = dir.path().join("u1");

        let removed = user_root.join("a/b/gone.txt");
        let kept = user_root.join("a/kept.txt");
        store
            .write(&removed, ContentSource::from(b"x".as_slice()))
            .await
            .expect("write");
        store
            .write(&kept, ContentSource::from(b"y".as_slice()))
            .await
            .expect("write");

        store.remove(&removed).await.expect("remove");
        store
            .clean_ancestors(&removed, &user_root)
            .await
            .expect("cleanup");

        assert!(!user_root.join("a/b").exists());
        // `a` still holds kept.txt, so the walk stops there.
        assert!(user_root.join("a").exists());
        assert!(kept.exists());
    }
}
