//! The listing fold: turn a flat prefix listing from the backend into a
//! one-level view of synthetic directory entries and file entries.

use std::collections::HashSet;

use bytes::Bytes;

use crate::backend::ObjectStore;
use crate::entry::Entry;
use crate::error::StoreError;
use crate::vpath;

/// List the immediate children of `relative` under `base_prefix`.
///
/// A key's suffix past the effective prefix determines its kind: a suffix
/// containing `/` contributes a directory entry named by its first segment
/// (reported at most once per call, however many descendants it has); a
/// bare suffix is a file entry carrying the backend's size and
/// last-modified metadata. The key equal to the prefix itself is the
/// prefix's own marker object and is skipped.
///
/// Result order: directories before files, case-insensitive ascending by
/// name within each group.
pub async fn list_entries(
    store: &dyn ObjectStore,
    base_prefix: &str,
    relative: &str,
) -> Result<Vec<Entry>, StoreError> {
    let effective = vpath::resolve_prefix(base_prefix, relative)?;
    let objects = store.list(&effective, None).await?;

    let mut entries = Vec::new();
    let mut seen_dirs: HashSet<String> = HashSet::new();

    for object in objects {
        let Some(suffix) = object.key.strip_prefix(effective.as_str()) else {
            continue;
        };
        if suffix.is_empty() {
            continue;
        }

        if let Some((first, _)) = suffix.split_once('/') {
            let dir_path = format!("{effective}{first}/");
            if seen_dirs.insert(dir_path.clone()) {
                entries.push(Entry::Directory {
                    name: first.to_string(),
                    path: dir_path,
                });
            }
        } else {
            entries.push(Entry::File {
                name: suffix.to_string(),
                path: object.key,
                size: object.size,
                last_modified: object.last_modified,
            });
        }
    }

    entries.sort_by(|a, b| {
        b.is_directory()
            .cmp(&a.is_directory())
            .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
    });

    tracing::debug!(prefix = %effective, entries = entries.len(), "Listing folded");
    Ok(entries)
}

/// Materialize a virtual directory by writing a zero-byte `.keep` marker
/// under its prefix. An empty prefix has no existence of its own in the
/// backend and would never show up in listings otherwise.
pub async fn create_directory(
    store: &dyn ObjectStore,
    base_prefix: &str,
    relative: &str,
) -> Result<(), StoreError> {
    let prefix = vpath::resolve_prefix(base_prefix, relative)?;
    if prefix.is_empty() {
        return Err(StoreError::InvalidPath(
            "directory path must not be empty".to_string(),
        ));
    }
    let marker = format!("{}{}", prefix, vpath::MARKER_NAME);
    store
        .put(&marker, "application/octet-stream", Bytes::new())
        .await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;
    use crate::backend::ObjectMeta;

    /// In-memory ObjectStore for exercising the fold without a network.
    struct MemoryStore {
        objects: Mutex<BTreeMap<String, (Bytes, String)>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                objects: Mutex::new(BTreeMap::new()),
            }
        }

        fn with_keys(keys: &[&str]) -> Self {
            let store = Self::new();
            {
                let mut objects = store.objects.lock().unwrap();
                for key in keys {
                    objects.insert(
                        key.to_string(),
                        (Bytes::from_static(b"x"), "text/plain".to_string()),
                    );
                }
            }
            store
        }
    }

    #[async_trait::async_trait]
    impl ObjectStore for MemoryStore {
        async fn list(
            &self,
            prefix: &str,
            max_results: Option<u32>,
        ) -> Result<Vec<ObjectMeta>, StoreError> {
            let objects = self.objects.lock().unwrap();
            let mut metas: Vec<ObjectMeta> = objects
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, (data, _))| ObjectMeta {
                    key: key.clone(),
                    size: data.len() as u64,
                    last_modified: None,
                })
                .collect();
            if let Some(max) = max_results {
                metas.truncate(max as usize);
            }
            Ok(metas)
        }

        async fn get(&self, key: &str) -> Result<(Bytes, String), StoreError> {
            let objects = self.objects.lock().unwrap();
            objects
                .get(key)
                .map(|(data, content_type)| (data.clone(), content_type.clone()))
                .ok_or_else(|| StoreError::NotFound(key.to_string()))
        }

        async fn put(
            &self,
            key: &str,
            content_type: &str,
            data: Bytes,
        ) -> Result<(), StoreError> {
            let mut objects = self.objects.lock().unwrap();
            objects.insert(key.to_string(), (data, content_type.to_string()));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            let mut objects = self.objects.lock().unwrap();
            objects
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(key.to_string()))
        }
    }

    #[tokio::test]
    async fn test_directories_sort_before_files_case_insensitive() {
        // {"b" dir, "A" file, "a" dir} -> [a/, b/, A]
        let store = MemoryStore::with_keys(&["b/nested.txt", "A", "a/other.txt"]);
        let entries = list_entries(&store, "", "").await.unwrap();
        let summary: Vec<(&str, bool)> = entries
            .iter()
            .map(|e| (e.name(), e.is_directory()))
            .collect();
        assert_eq!(summary, vec![("a", true), ("b", true), ("A", false)]);
    }

    #[tokio::test]
    async fn test_directory_reported_once() {
        let store = MemoryStore::with_keys(&[
            "docs/a.txt",
            "docs/b.txt",
            "docs/sub/deep.txt",
            "readme.md",
        ]);
        let entries = list_entries(&store, "", "").await.unwrap();
        let dirs: Vec<&str> = entries
            .iter()
            .filter(|e| e.is_directory())
            .map(|e| e.name())
            .collect();
        assert_eq!(dirs, vec!["docs"]);
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_one_level_view_under_prefix() {
        let store = MemoryStore::with_keys(&[
            "base/docs/a.txt",
            "base/docs/sub/deep.txt",
            "base/top.txt",
            "unrelated/z.txt",
        ]);
        let entries = list_entries(&store, "base/", "docs").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(
            &entries[0],
            Entry::Directory { name, path } if name == "sub" && path == "base/docs/sub/"
        ));
        assert!(matches!(
            &entries[1],
            Entry::File { name, path, size, .. }
                if name == "a.txt" && path == "base/docs/a.txt" && *size == 1
        ));
    }

    #[tokio::test]
    async fn test_prefix_marker_object_skipped() {
        // A key exactly equal to the prefix is the prefix's own marker.
        let store = MemoryStore::with_keys(&["docs/", "docs/a.txt"]);
        let entries = list_entries(&store, "", "docs").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "a.txt");
    }

    #[tokio::test]
    async fn test_listing_is_idempotent() {
        let store = MemoryStore::with_keys(&["a/x", "b.txt", "c/y/z", "B.txt"]);
        let first = list_entries(&store, "", "").await.unwrap();
        let second = list_entries(&store, "", "").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_created_directory_appears_in_listing() {
        let store = MemoryStore::new();
        create_directory(&store, "", "empty").await.unwrap();

        let entries = list_entries(&store, "", "").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(matches!(
            &entries[0],
            Entry::Directory { name, path } if name == "empty" && path == "empty/"
        ));

        // Inside the directory the marker shows up as an ordinary file.
        let inside = list_entries(&store, "", "empty").await.unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].name(), vpath::MARKER_NAME);
    }

    #[tokio::test]
    async fn test_create_directory_under_base() {
        let store = MemoryStore::new();
        create_directory(&store, "base/", "sub").await.unwrap();
        let (data, _) = store.get("base/sub/.keep").await.unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_create_directory_rejects_empty_path() {
        let store = MemoryStore::new();
        assert!(matches!(
            create_directory(&store, "", "").await,
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.delete("nope.txt").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let store = MemoryStore::new();
        store
            .put("x/y.txt", "text/plain", Bytes::from_static(b"hi"))
            .await
            .unwrap();
        let (data, content_type) = store.get("x/y.txt").await.unwrap();
        assert_eq!(data, Bytes::from_static(b"hi"));
        assert_eq!(content_type, "text/plain");
    }
}
