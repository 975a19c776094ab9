//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::handlers::{self, AppState};

/// Uploads beyond this size are rejected at the transport
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Allow browser clients from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/prompts", get(handlers::list_prompts))
        .route("/video", post(handlers::upload_video))
        .route("/video/:videoId/transcription", post(handlers::create_transcription))
        .route("/ai/complete", post(handlers::complete))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState, bind_address: &str, port: u16) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_address, port)).await?;
    info!("🌐 API server listening on http://{}:{}", bind_address, port);

    axum::serve(listener, app).await?;

    Ok(())
}
