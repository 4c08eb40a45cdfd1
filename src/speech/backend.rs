use super::protocol::RecognitionConfig;
use crate::call::CallChannel;
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Audio queued for a recognition session.
#[derive(Debug, Clone)]
pub enum AudioChunk {
    /// Raw encoded audio for one media frame
    Data(Vec<u8>),
    /// End of audio; no more data will follow
    Finish,
}

/// Asynchronous output of a recognition session.
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// An interim or final transcript for audio seen so far
    Result { transcript: String, is_final: bool },
    /// A session-scoped failure. The session stops producing results but the
    /// other channel and other calls are unaffected.
    Error { message: String },
}

/// Streaming recognition backend.
///
/// `open` must return promptly: connection setup happens in the background
/// and audio written before the connection is ready is buffered.
#[async_trait::async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Open a recognition session for one channel of one call. Returns the
    /// write handle and the stream of recognition events.
    async fn open(
        &self,
        channel: CallChannel,
        config: RecognitionConfig,
    ) -> Result<(RecognitionHandle, mpsc::Receiver<RecognitionEvent>)>;
}

/// Write side of one recognition session.
///
/// Only the stream lifecycle controller holds a handle, and only it may
/// close the session. Writes never propagate errors: a frame that cannot be
/// delivered is lost audio, not a reason to tear down the call.
pub struct RecognitionHandle {
    audio_tx: mpsc::Sender<AudioChunk>,
    closed: bool,
}

impl RecognitionHandle {
    pub fn new(audio_tx: mpsc::Sender<AudioChunk>) -> Self {
        Self {
            audio_tx,
            closed: false,
        }
    }

    /// Forward one audio buffer. Silently drops the frame if the session is
    /// closed, errored, or its queue is full.
    pub fn write(&self, buffer: Vec<u8>) {
        if self.closed {
            debug!("dropping audio frame written to closed recognition session");
            return;
        }
        if let Err(err) = self.audio_tx.try_send(AudioChunk::Data(buffer)) {
            warn!("dropping audio frame: {}", err);
        }
    }

    /// Signal end-of-audio. Closing an already-closed handle is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.audio_tx.try_send(AudioChunk::Finish).is_err() {
            debug!("recognition session already gone at close");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
