use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.dashboard.assets_path);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Provider webhooks
        .route("/status", post(handlers::call_status))
        .route("/transcription", post(handlers::transcription_received))
        // History queries
        .route("/api/history", get(handlers::get_history))
        // WebSockets: provider media in, dashboard events out
        .route("/media-stream", get(handlers::media_stream))
        .route("/ws", get(handlers::dashboard_socket))
        // Static dashboard assets
        .fallback_service(assets)
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
