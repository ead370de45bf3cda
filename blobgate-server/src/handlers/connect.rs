use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use blobgate_common::{lister, vpath};

use crate::azure::AzureBlobStore;
use crate::handlers::error_json;
use crate::state::{AppState, ConnectedStore};

#[derive(Deserialize)]
pub struct ConnectRequest {
    pub account_name: String,
    pub container_name: String,
    pub sas_token: String,
    #[serde(default)]
    pub directory_path: Option<String>,
}

/// POST /api/connect — build a new store handle, validate it with one trial
/// listing of the base directory, then replace the connection slot.
/// Any failure surfaces as 400 with the backend's message.
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConnectRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let base_prefix = match vpath::normalize_prefix(body.directory_path.as_deref().unwrap_or(""))
    {
        Ok(p) => p,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(error_json(&e.to_string()))),
    };

    let store = match AzureBlobStore::new(
        &body.account_name,
        &body.container_name,
        &body.sas_token,
    ) {
        Ok(s) => s,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(error_json(&e.to_string()))),
    };

    let conn = Arc::new(ConnectedStore { store, base_prefix });

    // Trial listing validates account, container, and token in one call.
    if let Err(e) = lister::list_entries(&conn.store, &conn.base_prefix, "").await {
        return (StatusCode::BAD_REQUEST, Json(error_json(&e.to_string())));
    }

    info!(
        account = %body.account_name,
        container = %body.container_name,
        base = %conn.base_prefix,
        "Connected to storage account"
    );
    state.set_connection(conn);

    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "connected" })),
    )
}
