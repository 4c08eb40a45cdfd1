use super::state::AppState;
use crate::call::TranscriptRecord;
use crate::dashboard::{CallStatusUpdate, DashboardEvent};
use crate::media::handle_media_socket;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

// ============================================================================
// Webhook payloads (the provider posts PascalCase form fields)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallStatusParams {
    pub call_sid: String,
    pub call_status: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub direction: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranscriptionParams {
    pub call_sid: String,
    pub transcription_text: Option<String>,
    pub transcription_status: Option<String>,
    pub recording_sid: Option<String>,
    pub recording_url: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /status
/// Call lifecycle webhook: merge into history and broadcast.
pub async fn call_status(
    State(state): State<AppState>,
    Form(params): Form<CallStatusParams>,
) -> impl IntoResponse {
    info!(
        "call status update: {} is {} (from {:?} to {:?})",
        params.call_sid, params.call_status, params.from, params.to
    );

    let update = CallStatusUpdate {
        call_sid: params.call_sid,
        status: params.call_status,
        from: params.from,
        to: params.to,
        direction: params.direction,
        duration: params.duration,
        timestamp: Utc::now(),
    };

    state.sink.record_call_status(update).await;
    StatusCode::OK
}

/// POST /transcription
/// Post-call transcription webhook: store and broadcast.
pub async fn transcription_received(
    State(state): State<AppState>,
    Form(params): Form<TranscriptionParams>,
) -> impl IntoResponse {
    info!(
        "post-call transcription received for call {} (recording {:?})",
        params.call_sid, params.recording_sid
    );

    let record = TranscriptRecord::from_recording(
        params.call_sid,
        params.recording_sid,
        params.recording_url,
        params.transcription_text,
        params
            .transcription_status
            .unwrap_or_else(|| "completed".to_string()),
    );

    state.sink.record_transcription(record).await;
    StatusCode::OK
}

/// GET /api/history
pub async fn get_history(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.sink.history().await)
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /media-stream
/// Upgrade the provider's media connection and hand it to the stream
/// lifecycle controller.
pub async fn media_stream(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_media_socket(socket, state))
}

/// GET /ws
/// Upgrade a dashboard observer connection.
pub async fn dashboard_socket(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_dashboard_observer(socket, state))
}

/// Serve one dashboard observer: snapshot first, then the live event stream
/// until either side disconnects.
async fn handle_dashboard_observer(socket: WebSocket, state: AppState) {
    let observer_id = uuid::Uuid::new_v4();
    info!("dashboard observer {} connected", observer_id);

    let (init, mut events) = state.sink.subscribe().await;
    let (mut sender, mut receiver) = socket.split();

    match serde_json::to_string(&init) {
        Ok(snapshot) => {
            if sender.send(Message::Text(snapshot)).await.is_err() {
                return;
            }
        }
        Err(err) => {
            warn!("failed to serialize init snapshot: {}", err);
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!("failed to serialize dashboard event: {}", err);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Best-effort delivery: a slow observer just loses events.
                    warn!("dashboard observer {} lagged, {} events lost", observer_id, missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = receiver.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // dashboards are read-only
                Some(Err(_)) => break,
            },
        }
    }

    info!("dashboard observer {} disconnected", observer_id);
}
