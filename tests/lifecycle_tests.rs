// Integration tests for the media stream lifecycle controller:
// start/media/stop handling, recognition result fan-out, teardown
// idempotence, and per-channel error isolation. Recognition is mocked
// behind the SpeechBackend trait so tests control results directly.

use async_trait::async_trait;
use base64::Engine;
use callscribe::{
    AppState, AudioChunk, CallChannel, CallStreamController, Config, DashboardEvent,
    RecognitionConfig, RecognitionEvent, RecognitionHandle, SpeechBackend,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

struct OpenedSession {
    channel: CallChannel,
    config: RecognitionConfig,
    events: mpsc::Sender<RecognitionEvent>,
    audio: mpsc::Receiver<AudioChunk>,
}

/// Recognition backend that records every open and hands the test the
/// event sender and audio receiver for each session.
#[derive(Clone, Default)]
struct MockSpeechBackend {
    opened: Arc<Mutex<Vec<OpenedSession>>>,
}

#[async_trait]
impl SpeechBackend for MockSpeechBackend {
    async fn open(
        &self,
        channel: CallChannel,
        config: RecognitionConfig,
    ) -> anyhow::Result<(RecognitionHandle, mpsc::Receiver<RecognitionEvent>)> {
        let (audio_tx, audio_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::channel(64);
        self.opened.lock().unwrap().push(OpenedSession {
            channel,
            config,
            events: event_tx,
            audio: audio_rx,
        });
        Ok((RecognitionHandle::new(audio_tx), event_rx))
    }
}

impl MockSpeechBackend {
    fn take_opened(&self) -> Vec<OpenedSession> {
        self.opened.lock().unwrap().drain(..).collect()
    }
}

fn test_state() -> (AppState, MockSpeechBackend) {
    let backend = MockSpeechBackend::default();
    let state = AppState::new(Config::default(), Arc::new(backend.clone()));
    (state, backend)
}

fn start_frame(call_sid: &str, stream_sid: &str) -> String {
    format!(r#"{{"event":"start","start":{{"callSid":"{call_sid}","streamSid":"{stream_sid}"}}}}"#)
}

fn media_frame(track: &str, audio: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(audio);
    format!(r#"{{"event":"media","media":{{"track":"{track}","payload":"{payload}"}}}}"#)
}

const STOP_FRAME: &str = r#"{"event":"stop"}"#;

async fn recv_event(rx: &mut broadcast::Receiver<DashboardEvent>) -> DashboardEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for dashboard event")
        .expect("dashboard event stream closed")
}

fn split_sessions(backend: &MockSpeechBackend) -> (OpenedSession, OpenedSession) {
    let mut opened = backend.take_opened();
    assert_eq!(opened.len(), 2, "expected one session per channel");
    let remote_idx = opened
        .iter()
        .position(|s| s.channel == CallChannel::Remote)
        .expect("remote channel session");
    let remote = opened.remove(remote_idx);
    let local = opened.pop().expect("local channel session");
    assert_eq!(local.channel, CallChannel::Local);
    (local, remote)
}

#[tokio::test]
async fn media_before_start_is_dropped() {
    let (state, backend) = test_state();
    let mut controller = CallStreamController::new(state.clone());

    controller
        .handle_frame(&media_frame("inbound", &[1, 2, 3]))
        .await;

    assert!(backend.take_opened().is_empty());
    assert!(state.registry.is_empty().await);
}

#[tokio::test]
async fn start_opens_one_telephony_session_per_channel() {
    let (state, backend) = test_state();
    let mut controller = CallStreamController::new(state.clone());

    controller.handle_frame(&start_frame("C0", "S0")).await;

    let (local, remote) = split_sessions(&backend);
    assert!(state.registry.contains("C0").await);
    for session in [&local, &remote] {
        assert_eq!(session.config.encoding, "mulaw");
        assert_eq!(session.config.sample_rate_hertz, 8000);
        assert!(session.config.interim_results);
    }
}

#[tokio::test]
async fn media_frames_route_to_the_matching_channel() {
    let (state, backend) = test_state();
    let mut controller = CallStreamController::new(state);

    controller.handle_frame(&start_frame("C1", "S1")).await;
    let (mut local, mut remote) = split_sessions(&backend);

    controller
        .handle_frame(&media_frame("inbound", &[10, 20]))
        .await;
    controller
        .handle_frame(&media_frame("outbound", &[30]))
        .await;

    match remote.audio.recv().await {
        Some(AudioChunk::Data(data)) => assert_eq!(data, vec![10, 20]),
        other => panic!("expected inbound audio, got {:?}", other),
    }
    match local.audio.recv().await {
        Some(AudioChunk::Data(data)) => assert_eq!(data, vec![30]),
        other => panic!("expected outbound audio, got {:?}", other),
    }

    // Stop signals end-of-audio on both sessions
    controller.handle_frame(STOP_FRAME).await;
    assert!(matches!(remote.audio.recv().await, Some(AudioChunk::Finish)));
    assert!(matches!(local.audio.recv().await, Some(AudioChunk::Finish)));
}

// Scenario A: a final inbound result is broadcast with the accumulated
// committed text.
#[tokio::test]
async fn final_result_broadcasts_live_transcript() {
    let (state, backend) = test_state();
    let (_init, mut rx) = state.sink.subscribe().await;
    let mut controller = CallStreamController::new(state);

    controller.handle_frame(&start_frame("C1", "S1")).await;
    let (_local, remote) = split_sessions(&backend);

    remote
        .events
        .send(RecognitionEvent::Result {
            transcript: "yes".to_string(),
            is_final: true,
        })
        .await
        .unwrap();

    match recv_event(&mut rx).await {
        DashboardEvent::LiveTranscript(update) => {
            assert_eq!(update.call_sid, "C1");
            assert_eq!(update.track, "inbound");
            assert_eq!(update.speaker, "remote");
            assert!(update.is_final);
            assert_eq!(update.transcript, "yes");
            assert_eq!(update.full_transcript, "yes ");
            assert_eq!(update.interim, "");
        }
        other => panic!("expected liveTranscript, got {:?}", other),
    }
}

#[tokio::test]
async fn interim_results_are_broadcast_but_not_committed() {
    let (state, backend) = test_state();
    let (_init, mut rx) = state.sink.subscribe().await;
    let mut controller = CallStreamController::new(state);

    controller.handle_frame(&start_frame("C7", "S7")).await;
    let (_local, remote) = split_sessions(&backend);

    remote
        .events
        .send(RecognitionEvent::Result {
            transcript: "hel".to_string(),
            is_final: false,
        })
        .await
        .unwrap();

    match recv_event(&mut rx).await {
        DashboardEvent::LiveTranscript(update) => {
            assert!(!update.is_final);
            assert_eq!(update.interim, "hel");
            assert_eq!(update.full_transcript, "");
        }
        other => panic!("expected liveTranscript, got {:?}", other),
    }
}

// Scenario B: both channels finalize text; stop yields one dual-channel
// transcription record.
#[tokio::test]
async fn stop_emits_one_dual_channel_record() {
    let (state, backend) = test_state();
    let (_init, mut rx) = state.sink.subscribe().await;
    let mut controller = CallStreamController::new(state.clone());

    controller.handle_frame(&start_frame("C2", "S2")).await;
    let (local, remote) = split_sessions(&backend);

    remote
        .events
        .send(RecognitionEvent::Result {
            transcript: "hello".to_string(),
            is_final: true,
        })
        .await
        .unwrap();
    recv_event(&mut rx).await;

    local
        .events
        .send(RecognitionEvent::Result {
            transcript: "hi there".to_string(),
            is_final: true,
        })
        .await
        .unwrap();
    recv_event(&mut rx).await;

    controller.handle_frame(STOP_FRAME).await;

    match recv_event(&mut rx).await {
        DashboardEvent::Transcription(record) => {
            assert_eq!(record.call_sid, "C2");
            assert_eq!(record.inbound.as_deref(), Some("hello"));
            assert_eq!(record.outbound.as_deref(), Some("hi there"));
            assert!(record.is_dual_channel);
            assert!(record.is_real_time);
            assert_eq!(record.status, "completed");
        }
        other => panic!("expected transcription, got {:?}", other),
    }

    assert!(state.registry.is_empty().await);
    assert_eq!(state.sink.history().await.transcriptions.len(), 1);
}

// Idempotence: a second stop does nothing and records nothing.
#[tokio::test]
async fn double_stop_produces_exactly_one_record() {
    let (state, backend) = test_state();
    let mut controller = CallStreamController::new(state.clone());

    controller.handle_frame(&start_frame("C3", "S3")).await;
    let (_local, remote) = split_sessions(&backend);

    remote
        .events
        .send(RecognitionEvent::Result {
            transcript: "only once".to_string(),
            is_final: true,
        })
        .await
        .unwrap();

    // Let the result pump apply before stopping
    tokio::time::sleep(Duration::from_millis(50)).await;

    controller.handle_frame(STOP_FRAME).await;
    controller.handle_frame(STOP_FRAME).await;
    controller.finish().await;

    assert_eq!(state.sink.history().await.transcriptions.len(), 1);
    assert!(state.registry.is_empty().await);
}

// Scenario C: silence is not logged.
#[tokio::test]
async fn silent_call_records_nothing() {
    let (state, backend) = test_state();
    let (_init, mut rx) = state.sink.subscribe().await;
    let mut controller = CallStreamController::new(state.clone());

    controller.handle_frame(&start_frame("C4", "S4")).await;
    let _sessions = split_sessions(&backend);
    controller.handle_frame(STOP_FRAME).await;

    assert!(state.registry.is_empty().await);
    assert!(state.sink.history().await.transcriptions.is_empty());
    assert!(
        timeout(Duration::from_millis(100), rx.recv()).await.is_err(),
        "no event should be broadcast for a silent call"
    );
}

// Scenario E: an error on one channel is surfaced without affecting the
// other channel.
#[tokio::test]
async fn channel_error_does_not_stop_the_other_channel() {
    let (state, backend) = test_state();
    let (_init, mut rx) = state.sink.subscribe().await;
    let mut controller = CallStreamController::new(state);

    controller.handle_frame(&start_frame("C5", "S5")).await;
    let (local, remote) = split_sessions(&backend);

    local
        .events
        .send(RecognitionEvent::Error {
            message: "backend hung up".to_string(),
        })
        .await
        .unwrap();

    match recv_event(&mut rx).await {
        DashboardEvent::Error { call_sid, message } => {
            assert_eq!(call_sid.as_deref(), Some("C5"));
            assert!(message.contains("backend hung up"));
        }
        other => panic!("expected error event, got {:?}", other),
    }

    remote
        .events
        .send(RecognitionEvent::Result {
            transcript: "still here".to_string(),
            is_final: true,
        })
        .await
        .unwrap();

    match recv_event(&mut rx).await {
        DashboardEvent::LiveTranscript(update) => {
            assert_eq!(update.track, "inbound");
            assert_eq!(update.full_transcript, "still here ");
        }
        other => panic!("expected liveTranscript, got {:?}", other),
    }
}

// Unknown event types and malformed frames never break the connection loop.
#[tokio::test]
async fn malformed_and_unknown_events_are_ignored() {
    let (state, backend) = test_state();
    let mut controller = CallStreamController::new(state.clone());

    controller.handle_frame("not json at all").await;
    controller.handle_frame(r#"{"event":"mark","mark":{}}"#).await;
    controller.handle_frame(r#"{"event":"start"}"#).await; // missing fields

    assert!(backend.take_opened().is_empty());
    assert!(state.registry.is_empty().await);

    // The controller still works afterwards
    controller.handle_frame(&start_frame("C6", "S6")).await;
    assert!(state.registry.contains("C6").await);
    controller.finish().await;
    assert!(state.registry.is_empty().await);
}

// A new start on the same connection tears the previous call down first.
#[tokio::test]
async fn restart_on_same_connection_closes_previous_call() {
    let (state, backend) = test_state();
    let mut controller = CallStreamController::new(state.clone());

    controller.handle_frame(&start_frame("C8", "S8")).await;
    let (_local, mut remote) = split_sessions(&backend);

    controller.handle_frame(&start_frame("C9", "S9")).await;

    assert!(matches!(remote.audio.recv().await, Some(AudioChunk::Finish)));
    assert!(!state.registry.contains("C8").await);
    assert!(state.registry.contains("C9").await);

    controller.finish().await;
    assert!(state.registry.is_empty().await);
}
