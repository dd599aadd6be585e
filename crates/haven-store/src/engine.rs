//! The scoped storage facade.
//!
//! Composes path authorization, the metadata index, quota accounting, and
//! the content store into the operations the routing layer consumes.
//! Every operation is a single pass `Unauthorized → PathResolved →
//! {Served | Rejected}`; rejections are immediate and nothing is retried
//! internally.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info};

use haven_core::{
    normalize_separators, unix_millis, FileInfo, FileList, FileListAdvance, Session, StorageConfig,
    StorageError, StorageStats,
};
use haven_index::{MetadataIndex, OrderedKv};

use crate::authorize::PathAuthorizer;
use crate::content::{ContentSource, ContentStore};
use crate::directory::{UserDirectory, UserRef};
use crate::quota::QuotaAccountant;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const OCTET_STREAM: &str = "application/octet-stream";

/// Per-write knobs carried alongside the body.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Declared transfer length, feeding the advisory quota gate. When
    /// unset, a buffered body's own length is used; a bare stream gates
    /// as zero.
    pub content_length: Option<u64>,

    /// Explicit content-type override; wins over every other source.
    pub content_type: Option<String>,

    /// Content type declared by the transfer itself. The default
    /// form-encoded type is treated as unset.
    pub declared_content_type: Option<String>,
}

/// The scoped storage engine.
///
/// All collaborators are injected by ownership at construction; there is
/// no ambient state.
pub struct ScopedStorage {
    authorizer: PathAuthorizer,
    index: MetadataIndex,
    content: ContentStore,
    quota: QuotaAccountant,
    directory: Arc<dyn UserDirectory>,
}

impl ScopedStorage {
    /// Assemble the engine from its collaborators.
    pub fn new(
        config: &StorageConfig,
        kv: Arc<dyn OrderedKv>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        info!(root = %config.storage_root.display(), "initialized scoped storage");
        Self {
            authorizer: PathAuthorizer::new(config.storage_root.clone()),
            index: MetadataIndex::new(kv),
            content: ContentStore::default(),
            quota: QuotaAccountant::new(config),
            directory,
        }
    }

    /// Open the file at `rel` for reading.
    pub async fn read_file(&self, session: &Session, rel: &str) -> Result<fs::File, StorageError> {
        let authorized = self.authorizer.authorize(session, rel)?;
        self.content.read(&authorized.content_path).await
    }

    /// Metadata record for the file at `rel`. Absent is `None`.
    pub async fn read_file_info(
        &self,
        session: &Session,
        rel: &str,
    ) -> Result<Option<FileInfo>, StorageError> {
        let authorized = self.authorizer.authorize(session, rel)?;
        Ok(self.index.file_info(&authorized.info_path).await?)
    }

    /// Write a file and its metadata record, returning the stored record.
    ///
    /// Two phases: content first, then metadata. There is no cross-store
    /// transaction; a crash between the phases leaves content without a
    /// matching record (or, on overwrite, a stale one) until the next
    /// successful write. Surfaced only as a later read inconsistency,
    /// never rolled back here.
    pub async fn write_file(
        &self,
        session: &Session,
        rel: &str,
        source: ContentSource,
        options: WriteOptions,
    ) -> Result<FileInfo, StorageError> {
        let authorized = self.authorizer.authorize(session, rel)?;

        let incoming = options
            .content_length
            .or_else(|| source.buffered_len())
            .unwrap_or(0);
        self.quota.check_write(&session.user_id, incoming).await?;

        let size = self.content.write(&authorized.content_path, source).await?;

        let name = authorized
            .content_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let info = FileInfo {
            name,
            size,
            modified: unix_millis(),
            content_type: Some(resolve_content_type(&authorized.content_path, &options)),
        };
        self.index.set_file_info(&authorized.info_path, &info).await?;

        debug!(path = %authorized.info_path, size, "wrote file");
        Ok(info)
    }

    /// Delete the file at `rel` and its metadata record.
    ///
    /// Content removal, record delete, then best-effort cleanup of
    /// now-empty ancestor directories up to (never including) the user
    /// root. An absent file is [`StorageError::NotFound`].
    pub async fn delete_file(&self, session: &Session, rel: &str) -> Result<(), StorageError> {
        let authorized = self.authorizer.authorize(session, rel)?;

        self.content.remove(&authorized.content_path).await?;
        self.index.delete_file_info(&authorized.info_path).await?;

        let user_root = self.authorizer.user_root(&session.user_id);
        self.content
            .clean_ancestors(&authorized.content_path, &user_root)
            .await?;

        debug!(path = %authorized.info_path, "deleted file");
        Ok(())
    }

    /// One page of the flat listing under `rel`, or under the user root
    /// when `rel` is `None`.
    ///
    /// Listing the root requires the literal global scope; a sub-path
    /// requires a scope prefix-match on the requested path. List paths
    /// only ever become key prefixes, so no filesystem traversal check
    /// applies here.
    pub async fn list_files(
        &self,
        session: &Session,
        rel: Option<&str>,
        page: u32,
    ) -> Result<FileList, StorageError> {
        let prefix = self.listing_prefix(session, rel)?;
        Ok(self.index.list(&prefix, page).await?)
    }

    /// One page of the listing under `rel` with the metadata records.
    pub async fn list_files_with_info(
        &self,
        session: &Session,
        rel: Option<&str>,
        page: u32,
    ) -> Result<FileListAdvance, StorageError> {
        let prefix = self.listing_prefix(session, rel)?;
        Ok(self.index.list_with_info(&prefix, page).await?)
    }

    /// Point-in-time usage and caps for the session's user.
    pub async fn storage_stats(&self, session: &Session) -> Result<StorageStats, StorageError> {
        self.quota.stats(&session.user_id).await
    }

    /// Read a file under a user's `public/` tree; no session is involved.
    pub async fn read_public_file(
        &self,
        username: &str,
        rel: &str,
    ) -> Result<fs::File, StorageError> {
        let user = self.public_user(username).await?;
        let authorized = self.authorizer.authorize_public(&user.id, rel)?;
        self.content.read(&authorized.content_path).await
    }

    /// Metadata record for a public file. Absent is `None`.
    pub async fn public_file_info(
        &self,
        username: &str,
        rel: &str,
    ) -> Result<Option<FileInfo>, StorageError> {
        let user = self.public_user(username).await?;
        let authorized = self.authorizer.authorize_public(&user.id, rel)?;
        Ok(self.index.file_info(&authorized.info_path).await?)
    }

    /// Batched metadata lookup under a user's `public/` tree.
    ///
    /// Paths are logical suffixes (leading `/`) under the public root;
    /// absent records map to `None`. An empty batch is a malformed
    /// request.
    pub async fn public_info_batch(
        &self,
        username: &str,
        paths: &[String],
    ) -> Result<BTreeMap<String, Option<FileInfo>>, StorageError> {
        let user = self.public_user(username).await?;
        if paths.is_empty() {
            return Err(StorageError::MalformedRequest(
                "expected a non-empty list of paths".to_string(),
            ));
        }

        let root = format!("/{}/public", user.id);
        let mut records = BTreeMap::new();
        for path in paths {
            let info = self.index.file_info(&format!("{root}{path}")).await?;
            records.insert(path.clone(), info);
        }
        Ok(records)
    }

    fn listing_prefix(
        &self,
        session: &Session,
        rel: Option<&str>,
    ) -> Result<String, StorageError> {
        match rel {
            None => {
                if !session.has_global_scope() {
                    return Err(StorageError::OutOfScope);
                }
                Ok(format!("/{}", session.user_id))
            }
            Some(rel) => {
                let rel = normalize_separators(rel);
                if !session.permits(&rel) {
                    return Err(StorageError::OutOfScope);
                }
                Ok(format!("/{}/{}", session.user_id, rel))
            }
        }
    }

    async fn public_user(&self, username: &str) -> Result<UserRef, StorageError> {
        self.directory
            .user_by_name(username)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("no user with username {username:?}")))
    }
}

/// Resolve the stored content type: explicit override, then extension
/// lookup, then the declared header (unless it is the default form-encoded
/// type), then the generic binary fallback.
fn resolve_content_type(path: &Path, options: &WriteOptions) -> String {
    if let Some(explicit) = &options.content_type {
        return explicit.clone();
    }
    if let Some(guessed) = mime_guess::from_path(path).first() {
        return guessed.essence_str().to_string();
    }
    match options.declared_content_type.as_deref() {
        Some(declared) if !declared.is_empty() && declared != FORM_URLENCODED => {
            declared.to_string()
        }
        _ => OCTET_STREAM.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_resolution_order() {
        let options = WriteOptions {
            content_type: Some("application/x-custom".to_string()),
            declared_content_type: Some("text/html".to_string()),
            ..WriteOptions::default()
        };
        // The override wins even over a known extension.
        assert_eq!(
            resolve_content_type(Path::new("a.txt"), &options),
            "application/x-custom"
        );

        let options = WriteOptions {
            declared_content_type: Some("text/html".to_string()),
            ..WriteOptions::default()
        };
        assert_eq!(
            resolve_content_type(Path::new("a.txt"), &options),
            "text/plain"
        );
        // Unknown extension falls through to the declared header.
        assert_eq!(
            resolve_content_type(Path::new("a.unknownext"), &options),
            "text/html"
        );

        let options = WriteOptions {
            declared_content_type: Some(FORM_URLENCODED.to_string()),
            ..WriteOptions::default()
        };
        // The default form-encoded header counts as unset.
        assert_eq!(
            resolve_content_type(Path::new("a.unknownext"), &options),
            OCTET_STREAM
        );

        assert_eq!(
            resolve_content_type(Path::new("a.unknownext"), &WriteOptions::default()),
            OCTET_STREAM
        );
    }
}
