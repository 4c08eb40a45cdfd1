use crate::call::{LiveTranscriptUpdate, TranscriptRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A call lifecycle update reported by the telephony provider's status
/// webhook (ringing, answered, completed, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStatusUpdate {
    pub call_sid: String,
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    /// Call duration in seconds, present on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    pub timestamp: DateTime<Utc>,
}

/// Committed history delivered to an observer on connect. Live in-flight
/// transcripts are deliberately not part of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub calls: Vec<CallStatusUpdate>,
    pub transcriptions: Vec<TranscriptRecord>,
}

/// Events pushed to connected dashboard observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum DashboardEvent {
    /// Snapshot of committed history, sent once when an observer connects
    Init(HistorySnapshot),

    /// Per-channel live state, sent on every recognition result
    LiveTranscript(LiveTranscriptUpdate),

    /// A finalized transcript record (real-time or webhook)
    Transcription(TranscriptRecord),

    /// A call lifecycle update from the status webhook
    CallStatus(CallStatusUpdate),

    /// A recognition failure scoped to one call
    #[serde(rename_all = "camelCase")]
    Error {
        call_sid: Option<String>,
        message: String,
    },
}
