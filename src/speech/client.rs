//! WebSocket client for the streaming recognition gateway
//!
//! `open` spawns a session task and returns immediately; audio written while
//! the connection is still being established queues in the handle's channel
//! and is flushed once the gateway is ready. Connection and protocol
//! failures surface as `RecognitionEvent::Error` on the event stream rather
//! than tearing anything down.

use super::backend::{AudioChunk, RecognitionEvent, RecognitionHandle, SpeechBackend};
use super::protocol::{GatewayRequest, GatewayResponse, RecognitionConfig};
use crate::call::CallChannel;
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Handshake deadline for the gateway connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Frames buffered while the connection is being established. At 20ms of
/// audio per telephony frame this is roughly five seconds.
const AUDIO_QUEUE_DEPTH: usize = 256;

const EVENT_QUEUE_DEPTH: usize = 64;

/// Recognition backend speaking the gateway protocol over WebSocket.
pub struct WsSpeechBackend {
    url: String,
}

impl WsSpeechBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait::async_trait]
impl SpeechBackend for WsSpeechBackend {
    async fn open(
        &self,
        channel: CallChannel,
        config: RecognitionConfig,
    ) -> Result<(RecognitionHandle, mpsc::Receiver<RecognitionEvent>)> {
        let (audio_tx, audio_rx) = mpsc::channel(AUDIO_QUEUE_DEPTH);
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        tokio::spawn(run_session(
            self.url.clone(),
            channel,
            config,
            audio_rx,
            event_tx,
        ));

        Ok((RecognitionHandle::new(audio_tx), event_rx))
    }
}

/// One recognition session from connect to close.
async fn run_session(
    url: String,
    channel: CallChannel,
    config: RecognitionConfig,
    mut audio_rx: mpsc::Receiver<AudioChunk>,
    event_tx: mpsc::Sender<RecognitionEvent>,
) {
    let ws_stream = match timeout(CONNECT_TIMEOUT, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(err)) => {
            report_error(&event_tx, format!("recognition connect failed: {}", err)).await;
            return;
        }
        Err(_) => {
            report_error(&event_tx, "recognition connect timed out".to_string()).await;
            return;
        }
    };

    info!(
        "recognition session open ({} channel, language {})",
        channel.track(),
        config.language_code
    );

    let (mut write, mut read) = ws_stream.split();

    let start = GatewayRequest::Start { config };
    let payload = match serde_json::to_string(&start) {
        Ok(payload) => payload,
        Err(err) => {
            report_error(&event_tx, format!("bad recognition config: {}", err)).await;
            return;
        }
    };
    if let Err(err) = write.send(Message::Text(payload)).await {
        report_error(&event_tx, format!("recognition handshake failed: {}", err)).await;
        return;
    }

    loop {
        tokio::select! {
            chunk = audio_rx.recv() => match chunk {
                Some(AudioChunk::Data(buffer)) => {
                    if let Err(err) = write.send(Message::Binary(buffer)).await {
                        report_error(&event_tx, format!("recognition write failed: {}", err)).await;
                        break;
                    }
                }
                // End of audio, or the handle was dropped
                Some(AudioChunk::Finish) | None => {
                    if let Ok(stop) = serde_json::to_string(&GatewayRequest::Stop) {
                        let _ = write.send(Message::Text(stop)).await;
                    }
                    let _ = write.close().await;
                    break;
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    forward_response(&event_tx, &text).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("recognition gateway closed the session");
                    break;
                }
                Some(Ok(_)) => {} // ping/pong/binary
                Some(Err(err)) => {
                    report_error(&event_tx, format!("recognition stream error: {}", err)).await;
                    break;
                }
            },
        }
    }

    debug!("recognition session task exiting ({} channel)", channel.track());
}

async fn forward_response(event_tx: &mpsc::Sender<RecognitionEvent>, text: &str) {
    match serde_json::from_str::<GatewayResponse>(text) {
        Ok(GatewayResponse::Result {
            transcript,
            is_final,
        }) => {
            let _ = event_tx
                .send(RecognitionEvent::Result {
                    transcript,
                    is_final,
                })
                .await;
        }
        Ok(GatewayResponse::Error { message }) => {
            let _ = event_tx.send(RecognitionEvent::Error { message }).await;
        }
        Err(err) => {
            warn!("unparseable recognition gateway message: {}", err);
        }
    }
}

async fn report_error(event_tx: &mpsc::Sender<RecognitionEvent>, message: String) {
    warn!("{}", message);
    let _ = event_tx.send(RecognitionEvent::Error { message }).await;
}
