use crate::call::CallChannel;
use base64::Engine;
use serde::Deserialize;
use tracing::warn;

/// One JSON frame on the provider's media WebSocket. Event types outside the
/// contract deserialize as `Unknown` and are ignored by the controller.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum MediaEvent {
    Start { start: StartFrame },
    Media { media: MediaFrame },
    Stop,
    #[serde(other)]
    Unknown,
}

/// Stream metadata delivered with the `start` event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartFrame {
    pub call_sid: String,
    pub stream_sid: String,
}

/// One audio frame from the `media` event: a base64 payload tagged with the
/// provider track label.
#[derive(Debug, Deserialize)]
pub struct MediaFrame {
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
}

impl MediaFrame {
    /// Decode this frame into raw audio tagged with its channel.
    ///
    /// Returns `None` (logged) when the track label is missing or unknown,
    /// the payload is missing, or the base64 is malformed. A dropped frame
    /// is lost audio; it never fails the stream.
    pub fn decode(&self) -> Option<(CallChannel, Vec<u8>)> {
        let track = match self.track.as_deref() {
            Some(track) => track,
            None => {
                warn!("media frame without track label, dropping");
                return None;
            }
        };

        let channel = match CallChannel::from_track(track) {
            Some(channel) => channel,
            None => {
                warn!("media frame with unknown track {:?}, dropping", track);
                return None;
            }
        };

        let payload = match self.payload.as_deref() {
            Some(payload) => payload,
            None => {
                warn!("media frame without payload, dropping");
                return None;
            }
        };

        match base64::engine::general_purpose::STANDARD.decode(payload) {
            Ok(buffer) => Some((channel, buffer)),
            Err(err) => {
                warn!("media frame with malformed base64 payload, dropping: {}", err);
                None
            }
        }
    }
}
