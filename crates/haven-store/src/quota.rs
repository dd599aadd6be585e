//! Recursive size accounting and quota gates.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tokio::fs;

use haven_core::{StorageConfig, StorageError, StorageStats};

/// Recursive byte total under `path`.
///
/// Files contribute their length; directories recurse; anything else
/// (sockets, symlinks, pipes) contributes 0 and is never followed. A
/// missing path also contributes 0, so a fresh user with no directory yet
/// can pass the write gate.
pub fn size_of(path: &Path) -> BoxFuture<'_, io::Result<u64>> {
    Box::pin(async move {
        let meta = match fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err),
        };
        if meta.is_file() {
            return Ok(meta.len());
        }
        if !meta.is_dir() {
            return Ok(0);
        }

        let mut total = 0u64;
        let mut entries = fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let child = entry.path();
            total += size_of(&child).await?;
        }
        Ok(total)
    })
}

/// Gates writes against the configured caps and reports usage.
///
/// Both checks are advisory snapshots taken before any byte lands;
/// concurrent writers can jointly exceed a cap. That race is accepted,
/// not defended against.
#[derive(Debug, Clone)]
pub struct QuotaAccountant {
    root: PathBuf,
    storage_max: Option<u64>,
    user_storage_max: Option<u64>,
}

impl QuotaAccountant {
    /// Accountant over the configured root and caps.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.storage_root.clone(),
            storage_max: config.storage_max,
            user_storage_max: config.user_storage_max,
        }
    }

    /// Pre-write gate: global cap first, then the per-user cap.
    pub async fn check_write(&self, user_id: &str, incoming: u64) -> Result<(), StorageError> {
        if let Some(limit) = self.storage_max {
            let used = size_of(&self.root).await?;
            if used + incoming > limit {
                return Err(StorageError::QuotaExceeded {
                    used,
                    incoming,
                    limit,
                });
            }
        }
        if let Some(limit) = self.user_storage_max {
            let used = size_of(&self.root.join(user_id)).await?;
            if used + incoming > limit {
                return Err(StorageError::UserQuotaExceeded {
                    used,
                    incoming,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Point-in-time usage and effective caps for one user.
    ///
    /// With a global cap, the user's effective cap is whatever remains of
    /// it globally plus what the user already holds, clamped by the
    /// per-user cap when one is set; `-1` means unbounded.
    pub async fn stats(&self, user_id: &str) -> Result<StorageStats, StorageError> {
        let used = size_of(&self.root.join(user_id)).await?;

        let max = match (self.storage_max, self.user_storage_max) {
            (Some(global), per_user) => {
                let total_used = size_of(&self.root).await?;
                let mut max = global as i64 - total_used as i64 + used as i64;
                if let Some(per_user) = per_user {
                    max = max.min(per_user as i64);
                }
                max
            }
            (None, Some(per_user)) => per_user as i64,
            (None, None) => -1,
        };

        let available = if max > 0 { max - used as i64 } else { -1 };
        Ok(StorageStats {
            used,
            available,
            max,
        })
    }
}
