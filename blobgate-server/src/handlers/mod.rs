pub mod connect;
pub mod files;

use axum::http::StatusCode;
use axum::Json;

use blobgate_common::error::StoreError;

pub(crate) fn error_json(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": { "message": message } })
}

/// Map a tagged store error onto the HTTP surface.
pub(crate) fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotConnected | StoreError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::AccessDenied(_) => StatusCode::FORBIDDEN,
        StoreError::Transient(_) | StoreError::Http(_) => StatusCode::BAD_GATEWAY,
        StoreError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(err: &StoreError) -> (StatusCode, Json<serde_json::Value>) {
    (status_for(err), Json(error_json(&err.to_string())))
}
