//! HTTP surface for the telephony provider and dashboards
//!
//! - POST /status - call lifecycle webhook (form-encoded)
//! - POST /transcription - post-call transcription webhook (form-encoded)
//! - GET /api/history - committed call + transcription history
//! - GET /ws - dashboard observer WebSocket
//! - GET /media-stream - provider media WebSocket
//! - GET /health - health check
//! - static dashboard assets served from the configured directory

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
