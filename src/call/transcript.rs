use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder text for a channel that never produced speech.
pub const NO_SPEECH_SENTINEL: &str = "(no speech detected)";

/// An immutable transcript record kept in the bounded history.
///
/// Two shapes share this type: real-time records produced once per call when
/// its media stream stops (per-channel `inbound`/`outbound` text), and
/// post-call records delivered by the provider's transcription webhook
/// (single `text` plus recording references).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub call_sid: String,

    /// Committed text for the remote speaker (real-time records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound: Option<String>,

    /// Committed text for the local speaker (real-time records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound: Option<String>,

    /// Transcript text (webhook records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_sid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,

    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub is_real_time: bool,
    pub is_dual_channel: bool,
}

impl TranscriptRecord {
    /// Record produced at stream stop from live dual-channel state. Either
    /// channel may be empty; an empty channel gets the sentinel. The caller
    /// is responsible for not producing a record when both are empty.
    pub fn realtime(call_sid: String, inbound: String, outbound: String) -> Self {
        let or_sentinel = |text: String| {
            if text.is_empty() {
                NO_SPEECH_SENTINEL.to_string()
            } else {
                text
            }
        };

        Self {
            call_sid,
            inbound: Some(or_sentinel(inbound)),
            outbound: Some(or_sentinel(outbound)),
            text: None,
            recording_sid: None,
            recording_url: None,
            status: "completed".to_string(),
            timestamp: Utc::now(),
            is_real_time: true,
            is_dual_channel: true,
        }
    }

    /// Record built from the provider's post-call transcription webhook.
    pub fn from_recording(
        call_sid: String,
        recording_sid: Option<String>,
        recording_url: Option<String>,
        text: Option<String>,
        status: String,
    ) -> Self {
        Self {
            call_sid,
            inbound: None,
            outbound: None,
            text: Some(text.unwrap_or_else(|| NO_SPEECH_SENTINEL.to_string())),
            recording_sid,
            recording_url,
            status,
            timestamp: Utc::now(),
            is_real_time: false,
            is_dual_channel: false,
        }
    }
}
