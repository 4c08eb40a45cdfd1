use super::transcript::TranscriptRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One of the two audio directions in a phone call.
///
/// The telephony provider labels media frames by track (`inbound` is audio
/// coming from the far end, `outbound` is audio we sent to them); speakers
/// are labeled by role instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallChannel {
    /// Our side of the call (provider track `outbound`)
    Local,
    /// The far end of the call (provider track `inbound`)
    Remote,
}

impl CallChannel {
    /// Both channels, in the order sessions are opened.
    pub const ALL: [CallChannel; 2] = [CallChannel::Local, CallChannel::Remote];

    /// Map a provider track label to a channel. Unknown labels are rejected.
    pub fn from_track(track: &str) -> Option<Self> {
        match track {
            "outbound" => Some(CallChannel::Local),
            "inbound" => Some(CallChannel::Remote),
            _ => None,
        }
    }

    /// The provider track label for this channel.
    pub fn track(&self) -> &'static str {
        match self {
            CallChannel::Local => "outbound",
            CallChannel::Remote => "inbound",
        }
    }

    /// Speaker role label used in dashboard events.
    pub fn speaker(&self) -> &'static str {
        match self {
            CallChannel::Local => "local",
            CallChannel::Remote => "remote",
        }
    }

    fn index(&self) -> usize {
        match self {
            CallChannel::Local => 0,
            CallChannel::Remote => 1,
        }
    }
}

/// Transcript state for a single channel of a call.
///
/// Committed text only ever grows; interim text is the tentative
/// continuation and is replaced wholesale by each non-final result.
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    committed: String,
    interim: String,
}

impl ChannelState {
    /// Apply one recognition result. Final results append to the committed
    /// text (with a separating space) and clear the interim text; non-final
    /// results replace the interim text.
    pub fn apply(&mut self, transcript: &str, is_final: bool) {
        if is_final {
            self.committed.push_str(transcript);
            self.committed.push(' ');
            self.interim.clear();
        } else {
            self.interim = transcript.to_string();
        }
    }

    /// Finalized text the backend will not revise.
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Tentative text following the committed text.
    pub fn interim(&self) -> &str {
        &self.interim
    }
}

/// Full per-channel state pushed to dashboards on every recognition result
/// (the live-typing effect).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTranscriptUpdate {
    pub call_sid: String,
    /// Provider track label (`inbound` / `outbound`)
    pub track: String,
    /// Speaker role (`remote` / `local`)
    pub speaker: String,
    /// The transcript fragment that triggered this update
    pub transcript: String,
    pub is_final: bool,
    /// Committed text for this channel so far
    pub full_transcript: String,
    /// Current interim text for this channel
    pub interim: String,
    pub timestamp: DateTime<Utc>,
}

/// Live transcription state for one active call.
///
/// Created when a media stream starts, mutated only by the stream lifecycle
/// controller and the recognition result pumps bound to it, and removed from
/// the registry when the stream stops.
#[derive(Debug, Clone)]
pub struct CallSession {
    call_sid: String,
    stream_sid: String,
    channels: [ChannelState; 2],
    last_update: DateTime<Utc>,
}

impl CallSession {
    pub fn new(call_sid: impl Into<String>, stream_sid: impl Into<String>) -> Self {
        Self {
            call_sid: call_sid.into(),
            stream_sid: stream_sid.into(),
            channels: [ChannelState::default(), ChannelState::default()],
            last_update: Utc::now(),
        }
    }

    pub fn call_sid(&self) -> &str {
        &self.call_sid
    }

    pub fn stream_sid(&self) -> &str {
        &self.stream_sid
    }

    pub fn channel(&self, channel: CallChannel) -> &ChannelState {
        &self.channels[channel.index()]
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    /// Merge one recognition result into this call's state and return the
    /// update to broadcast.
    pub fn apply_result(
        &mut self,
        channel: CallChannel,
        transcript: &str,
        is_final: bool,
    ) -> LiveTranscriptUpdate {
        self.channels[channel.index()].apply(transcript, is_final);
        self.last_update = Utc::now();

        let state = &self.channels[channel.index()];
        LiveTranscriptUpdate {
            call_sid: self.call_sid.clone(),
            track: channel.track().to_string(),
            speaker: channel.speaker().to_string(),
            transcript: transcript.to_string(),
            is_final,
            full_transcript: state.committed().to_string(),
            interim: state.interim().to_string(),
            timestamp: self.last_update,
        }
    }

    /// Produce the final transcript record for this call, consuming the
    /// session. Returns `None` when neither channel produced speech —
    /// silence is not logged.
    pub fn finalize(self) -> Option<TranscriptRecord> {
        let outbound = self.channel(CallChannel::Local).committed().trim().to_string();
        let inbound = self.channel(CallChannel::Remote).committed().trim().to_string();

        if inbound.is_empty() && outbound.is_empty() {
            return None;
        }

        Some(TranscriptRecord::realtime(self.call_sid, inbound, outbound))
    }
}

/// Live sessions keyed by call SID, shared across handler tasks.
#[derive(Clone, Default)]
pub struct CallRegistry {
    sessions: Arc<RwLock<HashMap<String, CallSession>>>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: CallSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.call_sid().to_string(), session);
    }

    /// Apply a recognition result to the named call. Returns `None` when the
    /// call is no longer live (results arriving after teardown are dropped).
    pub async fn apply_result(
        &self,
        call_sid: &str,
        channel: CallChannel,
        transcript: &str,
        is_final: bool,
    ) -> Option<LiveTranscriptUpdate> {
        let mut sessions = self.sessions.write().await;
        sessions
            .get_mut(call_sid)
            .map(|session| session.apply_result(channel, transcript, is_final))
    }

    pub async fn remove(&self, call_sid: &str) -> Option<CallSession> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(call_sid)
    }

    pub async fn contains(&self, call_sid: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(call_sid)
    }

    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::NO_SPEECH_SENTINEL;

    #[test]
    fn test_track_mapping() {
        assert_eq!(CallChannel::from_track("inbound"), Some(CallChannel::Remote));
        assert_eq!(CallChannel::from_track("outbound"), Some(CallChannel::Local));
        assert_eq!(CallChannel::from_track("both"), None);
        assert_eq!(CallChannel::Remote.track(), "inbound");
        assert_eq!(CallChannel::Local.speaker(), "local");
    }

    #[test]
    fn test_interim_then_final() {
        let mut state = ChannelState::default();

        state.apply("hel", false);
        assert_eq!(state.committed(), "");
        assert_eq!(state.interim(), "hel");

        state.apply("hello", true);
        assert_eq!(state.committed(), "hello ");
        assert_eq!(state.interim(), "");
    }

    #[test]
    fn test_committed_text_is_append_only() {
        let mut state = ChannelState::default();
        let mut last_len = 0;

        for (text, is_final) in [
            ("one", true),
            ("tw", false),
            ("two", true),
            ("thr", false),
            ("three", true),
        ] {
            state.apply(text, is_final);
            assert!(state.committed().len() >= last_len);
            assert!(state.committed().starts_with(&state.committed()[..last_len]));
            last_len = state.committed().len();
        }

        assert_eq!(state.committed(), "one two three ");
    }

    #[test]
    fn test_interim_replaced_wholesale() {
        let mut state = ChannelState::default();
        state.apply("how are", false);
        state.apply("how are you", false);
        assert_eq!(state.interim(), "how are you");
        assert_eq!(state.committed(), "");
    }

    #[test]
    fn test_apply_result_snapshot() {
        let mut session = CallSession::new("CA1", "MZ1");
        let update = session.apply_result(CallChannel::Remote, "yes", true);

        assert_eq!(update.call_sid, "CA1");
        assert_eq!(update.track, "inbound");
        assert_eq!(update.speaker, "remote");
        assert!(update.is_final);
        assert_eq!(update.full_transcript, "yes ");
        assert_eq!(update.interim, "");
    }

    #[test]
    fn test_finalize_silent_call_is_none() {
        let session = CallSession::new("CA2", "MZ2");
        assert!(session.finalize().is_none());
    }

    #[test]
    fn test_finalize_single_channel_gets_sentinel() {
        let mut session = CallSession::new("CA3", "MZ3");
        session.apply_result(CallChannel::Remote, "hello there", true);

        let record = session.finalize().expect("one channel spoke");
        assert_eq!(record.inbound.as_deref(), Some("hello there"));
        assert_eq!(record.outbound.as_deref(), Some(NO_SPEECH_SENTINEL));
        assert!(record.is_dual_channel);
        assert!(record.is_real_time);
    }

    #[test]
    fn test_interim_only_call_is_silent() {
        // Interim text never made it to committed, so nothing to record.
        let mut session = CallSession::new("CA4", "MZ4");
        session.apply_result(CallChannel::Local, "half a tho", false);
        assert!(session.finalize().is_none());
    }

    #[tokio::test]
    async fn test_registry_drops_results_for_removed_calls() {
        let registry = CallRegistry::new();
        registry.insert(CallSession::new("CA5", "MZ5")).await;

        let update = registry
            .apply_result("CA5", CallChannel::Remote, "yes", true)
            .await;
        assert!(update.is_some());

        registry.remove("CA5").await;
        let late = registry
            .apply_result("CA5", CallChannel::Remote, "late", true)
            .await;
        assert!(late.is_none());
        assert!(registry.is_empty().await);
    }
}
