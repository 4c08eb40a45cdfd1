use super::events::{CallStatusUpdate, DashboardEvent, HistorySnapshot};
use super::history::BoundedLog;
use crate::call::TranscriptRecord;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Buffered events per observer before slow observers start losing events.
const EVENT_BUFFER: usize = 256;

struct SinkInner {
    events: broadcast::Sender<DashboardEvent>,
    calls: RwLock<BoundedLog<CallStatusUpdate>>,
    transcriptions: RwLock<BoundedLog<TranscriptRecord>>,
}

/// Fan-out of dashboard events to all connected observers.
///
/// Delivery is best-effort: there is no acknowledgment or retry, and an
/// event published with no observers connected is simply gone. The bounded
/// call and transcription histories live here so that new observers can be
/// handed an `init` snapshot on connect.
#[derive(Clone)]
pub struct DashboardSink {
    inner: Arc<SinkInner>,
}

impl DashboardSink {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(SinkInner {
                events,
                calls: RwLock::new(BoundedLog::default()),
                transcriptions: RwLock::new(BoundedLog::default()),
            }),
        }
    }

    /// Publish an event to every connected observer.
    pub fn publish(&self, event: DashboardEvent) {
        // Err means no observers are connected; nothing to deliver to.
        if self.inner.events.send(event).is_err() {
            debug!("dashboard event published with no observers connected");
        }
    }

    /// Register a new observer: returns the `init` snapshot to send first
    /// and the live event stream.
    pub async fn subscribe(&self) -> (DashboardEvent, broadcast::Receiver<DashboardEvent>) {
        let receiver = self.inner.events.subscribe();
        let snapshot = self.history().await;
        (DashboardEvent::Init(snapshot), receiver)
    }

    /// Committed history for `init` snapshots and the history API.
    pub async fn history(&self) -> HistorySnapshot {
        let calls = self.inner.calls.read().await.snapshot();
        let transcriptions = self.inner.transcriptions.read().await.snapshot();
        HistorySnapshot {
            calls,
            transcriptions,
        }
    }

    /// Merge a call status update into history (later webhooks for the same
    /// call replace earlier ones) and broadcast it.
    pub async fn record_call_status(&self, update: CallStatusUpdate) {
        {
            let mut calls = self.inner.calls.write().await;
            let call_sid = update.call_sid.clone();
            calls.upsert_front(|existing| existing.call_sid == call_sid, update.clone());
        }
        self.publish(DashboardEvent::CallStatus(update));
    }

    /// Store a finalized transcript record and broadcast it.
    pub async fn record_transcription(&self, record: TranscriptRecord) {
        {
            let mut transcriptions = self.inner.transcriptions.write().await;
            transcriptions.push_front(record.clone());
        }
        self.publish(DashboardEvent::Transcription(record));
    }
}

impl Default for DashboardSink {
    fn default() -> Self {
        Self::new()
    }
}
