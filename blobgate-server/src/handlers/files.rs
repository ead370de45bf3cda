use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use blobgate_common::{lister, vpath, ObjectStore};

use crate::handlers::{error_json, error_response};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

/// GET /api/files?path= — one-level listing of the virtual directory.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    let conn = match state.connection() {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    match lister::list_entries(&conn.store, &conn.base_prefix, &query.path).await {
        Ok(entries) => (StatusCode::OK, Json(serde_json::json!(entries))),
        Err(e) => error_response(&e),
    }
}

/// POST /api/upload?path= — store one multipart file part at
/// `path/filename` (or `filename` when no path is given).
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
    mut multipart: Multipart,
) -> (StatusCode, Json<serde_json::Value>) {
    let conn = match state.connection() {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    let field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(error_json("request has no file part")),
            )
        }
        Err(e) => return (StatusCode::BAD_REQUEST, Json(error_json(&e.to_string()))),
    };

    let Some(filename) = field.file_name().map(str::to_string) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_json("file part has no filename")),
        );
    };
    let part_content_type = field.content_type().map(str::to_string);

    let data = match field.bytes().await {
        Ok(b) => b,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(error_json(&e.to_string()))),
    };

    let relative = if query.path.is_empty() {
        filename.clone()
    } else {
        format!("{}/{}", query.path.trim_matches('/'), filename)
    };
    let key = match vpath::resolve_key(&conn.base_prefix, &relative) {
        Ok(k) => k,
        Err(e) => return error_response(&e),
    };

    // A key that is simultaneously a file and a directory prefix would make
    // every later listing ambiguous, so probe before writing.
    match conn.store.list(&format!("{key}/"), Some(1)).await {
        Ok(existing) if !existing.is_empty() => {
            return (
                StatusCode::BAD_REQUEST,
                Json(error_json(&format!(
                    "a directory named `{filename}` already exists at this path"
                ))),
            )
        }
        Ok(_) => {}
        Err(e) => return error_response(&e),
    }

    let content_type = part_content_type.unwrap_or_else(|| {
        mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string()
    });

    match conn.store.put(&key, &content_type, data).await {
        Ok(()) => {
            info!(key = %key, "Uploaded");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "status": "uploaded" })),
            )
        }
        Err(e) => error_response(&e),
    }
}

/// GET /api/download?path= — raw bytes with the stored content type and an
/// attachment disposition named after the key's basename.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Response {
    let conn = match state.connection() {
        Ok(c) => c,
        Err(e) => return error_response(&e).into_response(),
    };

    let key = match vpath::resolve_key(&conn.base_prefix, &query.path) {
        Ok(k) => k,
        Err(e) => return error_response(&e).into_response(),
    };

    match conn.store.get(&key).await {
        Ok((data, content_type)) => {
            let response = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, data.len().to_string())
                .header(
                    header::CONTENT_DISPOSITION,
                    attachment_disposition(basename(&key)),
                )
                .body(Body::from(data));
            match response {
                Ok(r) => r,
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(error_json(&e.to_string())),
                )
                    .into_response(),
            }
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST /api/create-directory?path= — write the `.keep` marker that makes an
/// empty virtual directory visible.
pub async fn create_directory(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    let conn = match state.connection() {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    match lister::create_directory(&conn.store, &conn.base_prefix, &query.path).await {
        Ok(()) => {
            info!(path = %query.path, "Directory created");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "message": "Directory created successfully" })),
            )
        }
        Err(e) => error_response(&e),
    }
}

/// DELETE /api/delete?path= — deleting a missing key reports NotFound rather
/// than silently succeeding.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    let conn = match state.connection() {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    let key = match vpath::resolve_key(&conn.base_prefix, &query.path) {
        Ok(k) => k,
        Err(e) => return error_response(&e),
    };

    match conn.store.delete(&key).await {
        Ok(()) => {
            info!(key = %key, "Deleted");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "status": "deleted" })),
            )
        }
        Err(e) => error_response(&e),
    }
}

fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Stored keys may carry any bytes a client uploaded; control characters
/// would make the header value invalid, so they are replaced before the
/// name is quoted.
fn attachment_disposition(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    format!(
        "attachment; filename=\"{}\"",
        cleaned.replace('\\', "\\\\").replace('"', "\\\"")
    )
}
