//! Virtual-path resolution.
//!
//! Every caller-supplied path is resolved against the connection's base
//! directory before touching the backend. Containment is verified, not
//! assumed: traversal segments are rejected and the resolved key either
//! carries the base prefix already (a path echoed back from a listing) or is
//! re-rooted under it.

use crate::error::StoreError;

/// Name of the zero-byte object that makes an empty prefix visible as a
/// directory.
pub const MARKER_NAME: &str = ".keep";

/// Split a path into segments, dropping empty ones (collapses `//` and
/// leading/trailing separators) and rejecting `.` / `..`.
fn clean_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" => continue,
            "." | ".." => {
                return Err(StoreError::InvalidPath(format!(
                    "path segment `{segment}` is not allowed"
                )))
            }
            s => segments.push(s),
        }
    }
    Ok(segments)
}

/// Normalize a configured base directory into a storage prefix: empty stays
/// empty, anything else ends with exactly one `/`.
pub fn normalize_prefix(base: &str) -> Result<String, StoreError> {
    let segments = clean_segments(base)?;
    if segments.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{}/", segments.join("/")))
    }
}

/// Resolve a relative path into an effective listing prefix under
/// `base_prefix` (which must already be normalized). The result is empty or
/// ends with `/`.
///
/// Listings hand out full synthetic paths; clients echo them back on the
/// next call. A path that already starts with the base prefix is therefore
/// passed through (segments still checked), like `resolve_key` does.
pub fn resolve_prefix(base_prefix: &str, relative: &str) -> Result<String, StoreError> {
    let trimmed = relative.trim_matches('/');
    if trimmed.is_empty() || trimmed == base_prefix.trim_end_matches('/') {
        return Ok(base_prefix.to_string());
    }
    if !base_prefix.is_empty() && trimmed.starts_with(base_prefix) {
        clean_segments(trimmed)?;
        return Ok(format!("{trimmed}/"));
    }
    let segments = clean_segments(trimmed)?;
    Ok(format!("{}{}/", base_prefix, segments.join("/")))
}

/// Resolve a caller-supplied path into an absolute storage key under
/// `base_prefix`. Upload, download, and delete all go through here.
///
/// A path that already starts with the base prefix (as returned by a prior
/// listing) is passed through once its segments check out; anything else is
/// treated as relative and re-rooted.
pub fn resolve_key(base_prefix: &str, relative: &str) -> Result<String, StoreError> {
    let trimmed = relative.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath("empty object path".to_string()));
    }

    if !base_prefix.is_empty() && trimmed.starts_with(base_prefix) {
        // Echoed back from a listing. Still reject traversal segments.
        clean_segments(trimmed)?;
        return Ok(trimmed.to_string());
    }

    let segments = clean_segments(trimmed)?;
    if segments.is_empty() {
        return Err(StoreError::InvalidPath("empty object path".to_string()));
    }
    Ok(format!("{}{}", base_prefix, segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("").unwrap(), "");
        assert_eq!(normalize_prefix("/").unwrap(), "");
        assert_eq!(normalize_prefix("backup").unwrap(), "backup/");
        assert_eq!(normalize_prefix("/backup/photos/").unwrap(), "backup/photos/");
        assert_eq!(normalize_prefix("a//b").unwrap(), "a/b/");
        assert!(normalize_prefix("../x").is_err());
    }

    #[test]
    fn test_resolve_prefix() {
        assert_eq!(resolve_prefix("", "").unwrap(), "");
        assert_eq!(resolve_prefix("base/", "").unwrap(), "base/");
        assert_eq!(resolve_prefix("base/", "sub").unwrap(), "base/sub/");
        assert_eq!(resolve_prefix("base/", "/sub/deep/").unwrap(), "base/sub/deep/");
        assert_eq!(resolve_prefix("", "sub").unwrap(), "sub/");
    }

    #[test]
    fn test_resolve_prefix_passes_listing_paths_through() {
        // Directory paths echoed back from a listing already carry the base.
        assert_eq!(resolve_prefix("base/", "base/docs/").unwrap(), "base/docs/");
        assert_eq!(resolve_prefix("base/", "base").unwrap(), "base/");
        assert!(resolve_prefix("base/", "base/../x").is_err());
    }

    #[test]
    fn test_resolve_key_roots_under_base() {
        assert_eq!(resolve_key("base/", "file.txt").unwrap(), "base/file.txt");
        assert_eq!(resolve_key("base/", "/a/b.txt").unwrap(), "base/a/b.txt");
        assert_eq!(resolve_key("", "a/b.txt").unwrap(), "a/b.txt");
    }

    #[test]
    fn test_resolve_key_passes_listing_paths_through() {
        // A path returned by a prior listing already carries the base prefix.
        assert_eq!(resolve_key("base/", "base/a/b.txt").unwrap(), "base/a/b.txt");
        // But traversal hidden inside it is still rejected.
        assert!(resolve_key("base/", "base/../etc/passwd").is_err());
    }

    #[test]
    fn test_resolve_key_rejects_traversal() {
        for attempt in ["../secret", "a/../../b", "..", "./x", "a/./b"] {
            assert!(
                matches!(resolve_key("base/", attempt), Err(StoreError::InvalidPath(_))),
                "expected rejection for {attempt:?}"
            );
        }
    }

    #[test]
    fn test_resolve_key_containment() {
        // Whatever survives resolution must sit under the base prefix.
        let base = "base/dir/";
        for input in ["x", "/x/y", "x//y", "base/dir/z.txt", "base/other"] {
            let key = resolve_key(base, input).unwrap();
            assert!(key.starts_with(base), "{input:?} resolved to {key:?}");
        }
    }

    #[test]
    fn test_resolve_key_rejects_empty() {
        assert!(resolve_key("base/", "").is_err());
        assert!(resolve_key("base/", "///").is_err());
    }
}
