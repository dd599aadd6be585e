//! User lookup contract supplied by the session authority.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use haven_core::StorageError;

/// A user known to the session authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    /// Stable user id; the first segment of every logical path.
    pub id: String,
}

/// The slice of the session authority this engine consumes: resolving a
/// public username to its stable id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look a user up by username. Absent is `None`, not an error.
    async fn user_by_name(&self, username: &str) -> Result<Option<UserRef>, StorageError>;
}

/// In-memory user directory for tests and single-process embedding.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<String, String>>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `username` under the stable id `id`.
    pub async fn insert(&self, username: &str, id: &str) {
        self.users
            .write()
            .await
            .insert(username.to_string(), id.to_string());
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn user_by_name(&self, username: &str) -> Result<Option<UserRef>, StorageError> {
        Ok(self
            .users
            .read()
            .await
            .get(username)
            .map(|id| UserRef { id: id.clone() }))
    }
}
