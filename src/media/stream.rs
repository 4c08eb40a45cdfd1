use super::protocol::{MediaEvent, MediaFrame, StartFrame};
use crate::call::{CallChannel, CallSession};
use crate::dashboard::DashboardEvent;
use crate::http::AppState;
use crate::speech::{RecognitionConfig, RecognitionEvent, RecognitionHandle};
use axum::extract::ws::{Message, WebSocket};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The recognition sessions for one active media stream.
struct ActiveCall {
    call_sid: String,
    local: Option<RecognitionHandle>,
    remote: Option<RecognitionHandle>,
}

impl ActiveCall {
    fn session_mut(&mut self, channel: CallChannel) -> &mut Option<RecognitionHandle> {
        match channel {
            CallChannel::Local => &mut self.local,
            CallChannel::Remote => &mut self.remote,
        }
    }
}

/// State machine for one media connection.
///
/// Idle until a `start` event arrives, active while routing `media` frames
/// to the two channel recognition sessions, and closed after `stop` or
/// transport termination. Teardown always closes both sessions and removes
/// the call from the live registry, so recognition connections cannot leak
/// regardless of how the connection ends.
pub struct CallStreamController {
    state: AppState,
    active: Option<ActiveCall>,
}

impl CallStreamController {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            active: None,
        }
    }

    /// Handle one raw JSON frame from the media connection. Malformed frames
    /// are logged and ignored; this never fails the connection loop.
    pub async fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<MediaEvent>(text) {
            Ok(event) => self.handle_event(event).await,
            Err(err) => warn!("ignoring malformed media event: {}", err),
        }
    }

    pub async fn handle_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Start { start } => self.start(start).await,
            MediaEvent::Media { media } => self.media(media),
            MediaEvent::Stop => self.finish().await,
            MediaEvent::Unknown => debug!("ignoring unknown media event type"),
        }
    }

    /// IDLE → ACTIVE: register the call and open one recognition session per
    /// channel. A `start` while already active tears the previous call down
    /// first so its sessions cannot leak.
    async fn start(&mut self, start: StartFrame) {
        if self.active.is_some() {
            warn!("start event while a stream is already active, closing previous call");
            self.finish().await;
        }

        let StartFrame {
            call_sid,
            stream_sid,
        } = start;
        info!("media stream started for call {} (stream {})", call_sid, stream_sid);

        self.state
            .registry
            .insert(CallSession::new(call_sid.clone(), stream_sid))
            .await;

        let mut active = ActiveCall {
            call_sid: call_sid.clone(),
            local: None,
            remote: None,
        };

        for channel in CallChannel::ALL {
            let config = RecognitionConfig::telephony(&self.state.config.speech.language_code);
            match self.state.speech.open(channel, config).await {
                Ok((handle, events)) => {
                    spawn_result_pump(self.state.clone(), call_sid.clone(), channel, events);
                    *active.session_mut(channel) = Some(handle);
                }
                Err(err) => {
                    // The other channel keeps running; this one just has no audio path.
                    error!(
                        "failed to open recognition session ({} channel of call {}): {}",
                        channel.track(),
                        call_sid,
                        err
                    );
                    self.state.sink.publish(DashboardEvent::Error {
                        call_sid: Some(call_sid.clone()),
                        message: format!("failed to start speech recognition: {}", err),
                    });
                }
            }
        }

        self.active = Some(active);
    }

    /// ACTIVE self-loop: decode the frame and route it to its channel's
    /// session. Frames arriving before `start`, for an unopened channel, or
    /// after teardown are dropped, never queued.
    fn media(&mut self, frame: MediaFrame) {
        let Some(active) = self.active.as_mut() else {
            debug!("media frame with no active stream, dropping");
            return;
        };

        let Some((channel, buffer)) = frame.decode() else {
            return;
        };

        match active.session_mut(channel) {
            Some(handle) => handle.write(buffer),
            None => debug!(
                "media frame for unopened {} channel, dropping",
                channel.track()
            ),
        }
    }

    /// ACTIVE → CLOSED: close both recognition sessions, emit the final
    /// transcript, and drop the call from the live registry. Safe to call
    /// any number of times; only the first does work.
    pub async fn finish(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        info!("media stream stopped for call {}", active.call_sid);

        for channel in CallChannel::ALL {
            if let Some(handle) = active.session_mut(channel) {
                handle.close();
            }
        }

        match self.state.registry.remove(&active.call_sid).await {
            Some(session) => {
                if let Some(record) = session.finalize() {
                    self.state.sink.record_transcription(record).await;
                } else {
                    debug!("call {} produced no speech, nothing recorded", active.call_sid);
                }
            }
            None => warn!("no live session found for call {} at stop", active.call_sid),
        }
    }
}

/// Consume one channel's recognition events for the lifetime of its session.
///
/// Results apply in the order the backend emits them; an event arriving
/// after the call left the registry is dropped. Errors are surfaced to
/// observers without touching the session or the other channel.
fn spawn_result_pump(
    state: AppState,
    call_sid: String,
    channel: CallChannel,
    mut events: mpsc::Receiver<RecognitionEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                RecognitionEvent::Result {
                    transcript,
                    is_final,
                } => {
                    if transcript.trim().is_empty() {
                        continue;
                    }

                    match state
                        .registry
                        .apply_result(&call_sid, channel, &transcript, is_final)
                        .await
                    {
                        Some(update) => {
                            state.sink.publish(DashboardEvent::LiveTranscript(update));
                        }
                        None => {
                            debug!(
                                "recognition result for closed call {}, dropping",
                                call_sid
                            );
                        }
                    }
                }
                RecognitionEvent::Error { message } => {
                    error!(
                        "recognition error ({} channel of call {}): {}",
                        channel.track(),
                        call_sid,
                        message
                    );
                    state.sink.publish(DashboardEvent::Error {
                        call_sid: Some(call_sid.clone()),
                        message: format!("speech recognition error: {}", message),
                    });
                }
            }
        }

        debug!(
            "result pump finished ({} channel of call {})",
            channel.track(),
            call_sid
        );
    });
}

/// Drive a provider media WebSocket until it closes, then tear down.
pub async fn handle_media_socket(mut socket: WebSocket, state: AppState) {
    info!("media stream connection opened");
    let mut controller = CallStreamController::new(state);

    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Text(text)) => controller.handle_frame(&text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // binary/ping/pong are not part of the media protocol
            Err(err) => {
                warn!("media stream transport error: {}", err);
                break;
            }
        }
    }

    // Transport close or error is an implicit stop.
    controller.finish().await;
    info!("media stream connection closed");
}
