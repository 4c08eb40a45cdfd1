//! Recognition gateway protocol types
//!
//! The gateway speaks JSON over WebSocket: the client opens a session with a
//! `start` message carrying the recognition config, streams raw audio as
//! binary frames, and ends the session with `stop`. The gateway replies with
//! `result` messages (interim and final) and session-terminal `error`
//! messages.

use serde::{Deserialize, Serialize};

/// Telephony audio is 8kHz companded MULAW; the rate is fixed by the codec.
pub const MULAW_SAMPLE_RATE: u32 = 8000;

/// Static configuration for one streaming recognition session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecognitionConfig {
    /// Audio encoding (`mulaw` for telephony streams)
    pub encoding: String,

    pub sample_rate_hertz: u32,

    /// BCP-47 language code, e.g. `en-US` or `ar-SA`
    pub language_code: String,

    pub enable_automatic_punctuation: bool,

    /// Emit interim results while audio is still being recognized
    pub interim_results: bool,

    /// Acoustic model tier; the telephony-tuned model is English-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub use_enhanced: bool,
}

impl RecognitionConfig {
    /// Config for a live phone-call channel. The enhanced `phone_call` model
    /// is only available for English; other languages must use the generic
    /// model or the gateway rejects the session.
    pub fn telephony(language_code: &str) -> Self {
        let is_english = language_code.starts_with("en-");

        Self {
            encoding: "mulaw".to_string(),
            sample_rate_hertz: MULAW_SAMPLE_RATE,
            language_code: language_code.to_string(),
            enable_automatic_punctuation: true,
            interim_results: true,
            model: is_english.then(|| "phone_call".to_string()),
            use_enhanced: is_english,
        }
    }
}

/// Messages sent to the recognition gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayRequest {
    /// Open a recognition session (audio follows as binary frames)
    Start { config: RecognitionConfig },
    /// End of audio
    Stop,
}

/// Messages received from the recognition gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayResponse {
    Result { transcript: String, is_final: bool },
    Error { message: String },
}
