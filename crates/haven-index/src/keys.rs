//! Composite key construction for the metadata index.
//!
//! Keys follow the `[{namespace}!!]file!!{path}` scheme. The exclusive
//! upper bound for prefix scans is computed here, once, so the
//! increment-last-character arithmetic has a single tested home.

use crate::kv::KeyRange;

const FILE_KIND: &str = "file!!";
const NAMESPACE_DELIMITER: &str = "!!";

/// Builder for metadata index keys.
///
/// Single-tenant mode uses an empty namespace (`file!!{path}`);
/// multi-tenant deployments prepend `{namespace}!!` so tenants share one
/// physical keyspace without overlapping ranges.
#[derive(Debug, Clone, Default)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    /// Single-tenant keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespaced keyspace.
    pub fn namespaced(namespace: &str) -> Self {
        let namespace = if namespace.is_empty() || namespace.ends_with(NAMESPACE_DELIMITER) {
            namespace.to_string()
        } else {
            format!("{namespace}{NAMESPACE_DELIMITER}")
        };
        Self { namespace }
    }

    /// Key of the metadata record at `path`.
    pub fn file(&self, path: &str) -> String {
        format!("{}{}{}", self.namespace, FILE_KIND, path)
    }

    /// Exclusive-exclusive range covering every key strictly extending
    /// `path`.
    ///
    /// To cover a directory subtree without touching a sibling that merely
    /// shares the string prefix, pass `path` with its trailing separator:
    /// the bound of `/u1/` is the lexicographically adjacent `/u10`
    /// (`'/' + 1 == '0'`), so `/u10/...` stays outside the range.
    pub fn file_subtree(&self, path: &str) -> KeyRange {
        let start = self.file(path);
        let lt = next_prefix(&start);
        KeyRange { gt: start, lt }
    }
}

/// Smallest string strictly greater than every string starting with
/// `prefix`, or `None` when no finite bound exists.
///
/// The final character's code point is incremented by one, stepping over
/// the UTF-16 surrogate gap. A character already at `char::MAX` is dropped
/// and the carry moves left; a prefix made only of `char::MAX` characters
/// (or the empty prefix) has no finite upper bound.
pub fn next_prefix(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = next_char(last) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
        // `last` was char::MAX: carry into the previous character.
    }
    None
}

fn next_char(c: char) -> Option<char> {
    let mut code = u32::from(c) + 1;
    if (0xD800..=0xDFFF).contains(&code) {
        code = 0xE000;
    }
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn file_keys_compose_the_kind_and_path() {
        let keys = KeySpace::new();
        assert_eq!(keys.file("/u1/docs/a.txt"), "file!!/u1/docs/a.txt");
    }

    #[test]
    fn namespaced_keys_prepend_the_tenant_segment() {
        let keys = KeySpace::namespaced("tenant-a");
        assert_eq!(keys.file("/u1/a"), "tenant-a!!file!!/u1/a");
        // An already-delimited namespace is not delimited twice.
        let keys = KeySpace::namespaced("tenant-a!!");
        assert_eq!(keys.file("/u1/a"), "tenant-a!!file!!/u1/a");
    }

    #[test]
    fn next_prefix_increments_the_last_character() {
        assert_eq!(next_prefix("a/b"), Some("a/c".to_string()));
        assert_eq!(next_prefix("file!!/u1/"), Some("file!!/u10".to_string()));
    }

    #[test]
    fn next_prefix_steps_over_the_surrogate_gap() {
        assert_eq!(next_prefix("a\u{D7FF}"), Some("a\u{E000}".to_string()));
    }

    #[test]
    fn next_prefix_carries_past_the_maximum_code_point() {
        assert_eq!(
            next_prefix("ab\u{10FFFF}"),
            Some("ac".to_string()),
        );
        assert_eq!(next_prefix("\u{10FFFF}\u{10FFFF}"), None);
        assert_eq!(next_prefix(""), None);
    }

    #[test]
    fn subtree_range_excludes_the_adjacent_sibling() {
        let keys = KeySpace::new();
        let range = keys.file_subtree("/u1/");
        assert!(range.contains("file!!/u1/a.txt"));
        assert!(range.contains("file!!/u1/docs/deep/b.txt"));
        assert!(!range.contains("file!!/u1/"));
        assert!(!range.contains("file!!/u10"));
        assert!(!range.contains("file!!/u10/x.txt"));
        assert!(!range.contains("file!!/u2/a.txt"));
    }

    proptest! {
        // Membership in the exclusive range is exactly "strictly extends
        // the prefix" for any valid UTF-8 strings.
        #[test]
        fn range_membership_is_strict_prefix_extension(
            prefix in "[a-z/!\u{00e9}\u{4e00}]{1,8}",
            key in "[a-z/!\u{00e9}\u{4e00}]{0,12}",
        ) {
            let upper = next_prefix(&prefix);
            let range = KeyRange { gt: prefix.clone(), lt: upper };
            let extends = key.starts_with(&prefix) && key != prefix;
            prop_assert_eq!(range.contains(&key), extends);
        }
    }
}
