//! Per-call transcription state
//!
//! This module owns the live state of an in-progress call:
//! - `CallChannel`: the two audio directions of a phone call
//! - `ChannelState`: committed vs. interim transcript text for one channel
//! - `CallSession`: the two channel states plus call/stream identity
//! - `CallRegistry`: live sessions keyed by call SID
//! - `TranscriptRecord`: the immutable record produced when a call ends

mod session;
mod transcript;

pub use session::{
    CallChannel, CallRegistry, CallSession, ChannelState, LiveTranscriptUpdate,
};
pub use transcript::{TranscriptRecord, NO_SPEECH_SENTINEL};
