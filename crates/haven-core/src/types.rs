//! Wire-level domain types shared across the storage engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata record kept for every stored file.
///
/// Written whole on every successful write (last-writer-wins, never
/// versioned) and removed when the file is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Base name of the file (final path segment).
    pub name: String,
    /// Stored size in bytes, as reported by the content store.
    pub size: u64,
    /// Last write time, unix milliseconds.
    pub modified: u64,
    /// Resolved content type, when one was determined.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub content_type: Option<String>,
}

/// One page of a flat prefix listing.
///
/// Entries are key suffixes relative to the listed prefix, in
/// key-lexicographic order. `page` carries the next page number and is
/// omitted from the wire when no further results exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    /// Relative path suffixes under the listed prefix.
    pub entries: Vec<String>,
    /// Next page number, present only when more results exist.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page: Option<u32>,
}

/// One page of a prefix listing carrying the metadata records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListAdvance {
    /// Relative path suffix mapped to its metadata record.
    pub entries: BTreeMap<String, FileInfo>,
    /// Next page number, present only when more results exist.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page: Option<u32>,
}

/// Point-in-time storage usage for one user.
///
/// `available` and `max` are `-1` when no cap bounds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Bytes currently stored under the user's root.
    pub used: u64,
    /// Bytes the user may still write, or `-1` when unbounded.
    pub available: i64,
    /// Effective cap for the user, or `-1` when unbounded.
    pub max: i64,
}

/// Current time as unix milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
