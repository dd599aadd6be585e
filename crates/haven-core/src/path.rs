//! Lexical path resolution for the per-user content tree.
//!
//! Resolution is purely lexical: `.` and `..` are collapsed against the
//! request path itself, never against the filesystem, so a request can
//! never observe or escape through symlinks.

use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// Normalize request path separators to `/`.
pub fn normalize_separators(rel: &str) -> String {
    rel.replace('\\', "/")
}

/// Resolved request paths, computed once per request and reused by the
/// metadata index and the content store so the same file is never
/// re-resolved with different results mid-request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute path in the content tree.
    pub content_path: PathBuf,
    /// Normalized relative path: no `.`/`..` segments, `/`-separated.
    pub rel: String,
}

/// Resolve `rel` under `root`, collapsing `.` and `..` lexically.
///
/// Rejects with [`StorageError::MalformedPath`] any path that climbs above
/// `root` or lands on `root` itself: the root directory is never a valid
/// file target. A leading separator in the request is treated as relative
/// to `root`, matching how request paths are joined on the wire.
pub fn resolve_under(root: &Path, rel: &str) -> Result<ResolvedPath, StorageError> {
    let rel = normalize_separators(rel);
    let mut segments: Vec<String> = Vec::new();
    for component in Path::new(&rel).components() {
        match component {
            Component::Normal(segment) => match segment.to_str() {
                Some(segment) => segments.push(segment.to_string()),
                None => return Err(StorageError::MalformedPath),
            },
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(StorageError::MalformedPath);
                }
            }
        }
    }
    if segments.is_empty() {
        return Err(StorageError::MalformedPath);
    }

    let mut content_path = root.to_path_buf();
    for segment in &segments {
        content_path.push(segment);
    }
    Ok(ResolvedPath {
        content_path,
        rel: segments.join("/"),
    })
}
