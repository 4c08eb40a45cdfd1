pub mod call;
pub mod config;
pub mod dashboard;
pub mod http;
pub mod media;
pub mod speech;

pub use call::{
    CallChannel, CallRegistry, CallSession, ChannelState, LiveTranscriptUpdate, TranscriptRecord,
    NO_SPEECH_SENTINEL,
};
pub use config::Config;
pub use dashboard::{
    BoundedLog, CallStatusUpdate, DashboardEvent, DashboardSink, HistorySnapshot, HISTORY_CAP,
};
pub use http::{create_router, AppState};
pub use media::{CallStreamController, MediaEvent};
pub use speech::{
    AudioChunk, RecognitionConfig, RecognitionEvent, RecognitionHandle, SpeechBackend,
    WsSpeechBackend,
};
