use std::sync::{Arc, RwLock};

use blobgate_common::error::StoreError;

use crate::azure::AzureBlobStore;

/// One connected account/container plus the base directory prefix all of its
/// paths are confined under (empty, or ending in `/`).
pub struct ConnectedStore {
    pub store: AzureBlobStore,
    pub base_prefix: String,
}

/// Shared application state.
///
/// The connection slot is written only by connect and snapshotted once per
/// request: handlers clone the `Arc` out at entry and run the whole request
/// against that handle, so a racing reconnect never tears an in-flight
/// operation. A second connect replaces the slot wholesale.
pub struct AppState {
    connection: RwLock<Option<Arc<ConnectedStore>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            connection: RwLock::new(None),
        }
    }

    /// Snapshot the current connection, or fail with NotConnected.
    pub fn connection(&self) -> Result<Arc<ConnectedStore>, StoreError> {
        self.connection
            .read()
            .unwrap()
            .clone()
            .ok_or(StoreError::NotConnected)
    }

    pub fn set_connection(&self, conn: Arc<ConnectedStore>) {
        *self.connection.write().unwrap() = Some(conn);
    }
}
