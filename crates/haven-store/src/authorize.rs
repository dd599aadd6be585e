//! Path scope authorization.

use std::path::PathBuf;

use haven_core::{normalize_separators, resolve_under, Session, StorageError};

/// The authorized pair of paths a request operates on.
///
/// Computed once per request; the metadata index and the content store
/// both consume this pair, so the same file is never re-resolved with
/// different results mid-request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedPath {
    /// Absolute path in the content tree.
    pub content_path: PathBuf,
    /// Logical path keying the metadata record.
    pub info_path: String,
}

/// Validates requested paths against the storage root and session scopes.
#[derive(Debug, Clone)]
pub struct PathAuthorizer {
    root: PathBuf,
}

impl PathAuthorizer {
    /// Authorizer over the given storage root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of one user's content tree.
    pub fn user_root(&self, user_id: &str) -> PathBuf {
        self.root.join(user_id)
    }

    /// Authorize `rel` for the session.
    ///
    /// Traversal is checked first ([`StorageError::MalformedPath`]), then
    /// scope coverage ([`StorageError::OutOfScope`]). The scope test runs
    /// against the separator-normalized request path, before `.`/`..`
    /// collapse, exactly as granted scopes are compared on the wire.
    pub fn authorize(&self, session: &Session, rel: &str) -> Result<AuthorizedPath, StorageError> {
        let user_root = self.user_root(&session.user_id);
        let resolved = resolve_under(&user_root, rel)?;

        if !session.permits(&normalize_separators(rel)) {
            return Err(StorageError::OutOfScope);
        }

        Ok(AuthorizedPath {
            content_path: resolved.content_path,
            info_path: format!("/{}/{}", session.user_id, resolved.rel),
        })
    }

    /// Authorize a public read of `rel` under the user's `public/` tree.
    ///
    /// No session or scope is involved; only the traversal check applies.
    pub fn authorize_public(
        &self,
        user_id: &str,
        rel: &str,
    ) -> Result<AuthorizedPath, StorageError> {
        let public_root = self.user_root(user_id).join("public");
        let resolved = resolve_under(&public_root, rel)?;
        Ok(AuthorizedPath {
            content_path: resolved.content_path,
            info_path: format!("/{}/public/{}", user_id, resolved.rel),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_core::Scope;

    fn authorizer() -> PathAuthorizer {
        PathAuthorizer::new("/srv/haven")
    }

    fn session(scopes: &[&str]) -> Session {
        Session {
            id: "sess".to_string(),
            user_id: "u1".to_string(),
            scopes: scopes.iter().map(|s| Scope::from(*s)).collect(),
            created_at: 0,
        }
    }

    #[test]
    fn authorizes_in_scope_paths() {
        let authorized = authorizer()
            .authorize(&session(&["/docs"]), "docs/a.txt")
            .expect("authorized");
        assert_eq!(
            authorized.content_path,
            PathBuf::from("/srv/haven/u1/docs/a.txt")
        );
        assert_eq!(authorized.info_path, "/u1/docs/a.txt");
    }

    #[test]
    fn traversal_is_rejected_before_scopes_are_consulted() {
        // Even the global scope never authorizes an escape.
        assert!(matches!(
            authorizer().authorize(&session(&["/"]), "../u2/secret"),
            Err(StorageError::MalformedPath)
        ));
        assert!(matches!(
            authorizer().authorize(&session(&["/"]), ""),
            Err(StorageError::MalformedPath)
        ));
    }

    #[test]
    fn out_of_scope_paths_are_rejected() {
        assert!(matches!(
            authorizer().authorize(&session(&["/docs"]), "pictures/cat.png"),
            Err(StorageError::OutOfScope)
        ));
    }

    #[test]
    fn the_info_path_uses_the_collapsed_request_path() {
        let authorized = authorizer()
            .authorize(&session(&["/docs"]), "docs/../docs/b.txt")
            .expect("authorized");
        assert_eq!(authorized.info_path, "/u1/docs/b.txt");
    }

    #[test]
    fn public_paths_skip_scopes_but_not_traversal() {
        let authorized = authorizer()
            .authorize_public("u1", "site/index.html")
            .expect("authorized");
        assert_eq!(
            authorized.content_path,
            PathBuf::from("/srv/haven/u1/public/site/index.html")
        );
        assert_eq!(authorized.info_path, "/u1/public/site/index.html");

        assert!(matches!(
            authorizer().authorize_public("u1", "../private.txt"),
            Err(StorageError::MalformedPath)
        ));
    }
}
