//! Streaming speech recognition
//!
//! One recognition session is held open per (call, channel) pair for the
//! lifetime of a media stream:
//! - `SpeechBackend`: the seam between the stream lifecycle controller and
//!   the recognition service; implemented over WebSocket in `client`, and by
//!   mocks in the integration tests
//! - `RecognitionHandle`: write/close interface owned by the controller
//! - `RecognitionEvent`: interim/final results and session-scoped errors

mod backend;
mod client;
mod protocol;

pub use backend::{AudioChunk, RecognitionEvent, RecognitionHandle, SpeechBackend};
pub use client::WsSpeechBackend;
pub use protocol::{GatewayRequest, GatewayResponse, RecognitionConfig, MULAW_SAMPLE_RATE};
