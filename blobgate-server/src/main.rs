mod azure;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use state::AppState;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_STATIC_DIR: &str = "web/dist";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    info!("blobgate-server starting");

    let port: u16 = std::env::var("BLOBGATE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let static_dir =
        std::env::var("BLOBGATE_STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string());

    let state = Arc::new(AppState::new());
    let app = routes::build_router(state, &static_dir).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port = port, "Listening on http://0.0.0.0:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
