use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row of a directory listing.
///
/// Directories are synthetic: they are inferred from key-prefix structure and
/// carry no backend object of their own. `path` is the full storage key for
/// files and the synthetic prefix (ending in `/`) for directories; clients
/// feed it back into download/delete/list calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Directory {
        name: String,
        path: String,
    },
    File {
        name: String,
        path: String,
        size: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_modified: Option<DateTime<Utc>>,
    },
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Directory { name, .. } => name,
            Entry::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Entry::Directory { path, .. } => path,
            Entry::File { path, .. } => path,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }
}
