use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::handlers::{connect, files};
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

// Dev origins the SPA is served from.
const CORS_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
];

pub fn build_router(state: Arc<AppState>, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(CORS_ORIGINS.map(|o| o.parse::<HeaderValue>().unwrap()))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/connect", post(connect::connect))
        .route("/api/files", get(files::list_files))
        .route("/api/upload", post(files::upload))
        .route("/api/download", get(files::download))
        .route("/api/create-directory", post(files::create_directory))
        .route("/api/delete", delete(files::delete_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .fallback_service(
            ServeDir::new(static_dir)
                .fallback(ServeFile::new(format!("{static_dir}/index.html"))),
        )
        .with_state(state)
}
