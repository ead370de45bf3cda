use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Metadata for one stored object, as reported by a prefix listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Trait implemented by object-storage backends.
///
/// The backend is an opaque key-value blob store: it knows nothing about
/// virtual directories. Path resolution and the listing fold live above this
/// seam; the backend is responsible only for raw get/put/delete/list I/O.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all objects whose key starts with `prefix`, never truncated.
    /// Implementations must consume any backend continuation tokens
    /// internally. `max_results` bounds the listing when `Some`; probes use
    /// it to avoid pulling a full result set.
    async fn list(&self, prefix: &str, max_results: Option<u32>)
        -> Result<Vec<ObjectMeta>, StoreError>;

    /// Fetch an object's content and stored content type.
    async fn get(&self, key: &str) -> Result<(Bytes, String), StoreError>;

    /// Store an object, overwriting any existing content at `key`.
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), StoreError>;

    /// Delete an object. Deleting a missing key is an error, not a no-op.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
