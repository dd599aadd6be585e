//! Sessions and capability scopes.
//!
//! Sessions are issued, refreshed, and expired by the external session
//! authority; this engine only reads them.

use serde::{Deserialize, Serialize};

/// A path-prefix capability attached to a session.
///
/// Scopes carry a leading `/`; the global scope is the literal `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// Wrap a scope string.
    pub fn new(scope: impl Into<String>) -> Self {
        Scope(scope.into())
    }

    /// The scope as its raw string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the literal global scope `/`.
    pub fn is_global(&self) -> bool {
        self.0 == "/"
    }

    /// Raw string-prefix authorization test.
    ///
    /// The scope's leading `/` is stripped and the requested relative path
    /// must start with the remainder. The comparison is not segment-aware:
    /// `/ab` permits `abc/x`. Callers depend on these exact semantics; a
    /// stricter segment-aware variant belongs here under a new name.
    pub fn permits(&self, rel: &str) -> bool {
        let prefix = self.0.strip_prefix('/').unwrap_or(&self.0);
        rel.starts_with(prefix)
    }
}

impl From<&str> for Scope {
    fn from(scope: &str) -> Self {
        Scope(scope.to_string())
    }
}

/// A validated session, read-only to the storage engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session token.
    pub id: String,
    /// Owning user id.
    pub user_id: String,
    /// Granted path-prefix capabilities.
    pub scopes: Vec<Scope>,
    /// Issue time, unix milliseconds.
    pub created_at: u64,
}

impl Session {
    /// True when any granted scope permits `rel`.
    pub fn permits(&self, rel: &str) -> bool {
        self.scopes.iter().any(|scope| scope.permits(rel))
    }

    /// True when the session holds the literal global scope.
    pub fn has_global_scope(&self) -> bool {
        self.scopes.iter().any(Scope::is_global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(scopes: &[&str]) -> Session {
        Session {
            id: "sess".to_string(),
            user_id: "u1".to_string(),
            scopes: scopes.iter().map(|s| Scope::from(*s)).collect(),
            created_at: 0,
        }
    }

    #[test]
    fn global_scope_permits_everything() {
        let session = session(&["/"]);
        assert!(session.permits("docs/a.txt"));
        assert!(session.permits(""));
        assert!(session.has_global_scope());
    }

    #[test]
    fn scope_is_a_plain_prefix_over_the_relative_path() {
        let session = session(&["/docs"]);
        assert!(session.permits("docs/a.txt"));
        assert!(session.permits("docs"));
        assert!(!session.permits("pictures/a.png"));
        assert!(!session.has_global_scope());
    }

    #[test]
    fn scope_prefix_is_raw_not_segment_aware() {
        // `/ab` permitting `abc/x` is load-bearing compatibility behavior.
        let scope = Scope::from("/ab");
        assert!(scope.permits("abc/x"));
        assert!(scope.permits("ab/x"));
        assert!(!scope.permits("a"));
    }

    #[test]
    fn any_of_several_scopes_suffices() {
        let session = session(&["/docs", "/pictures"]);
        assert!(session.permits("pictures/cat.png"));
        assert!(session.permits("docs/a.txt"));
        assert!(!session.permits("music/x.mp3"));
    }
}
