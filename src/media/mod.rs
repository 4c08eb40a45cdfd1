//! Telephony media stream handling
//!
//! The provider drives one WebSocket connection per call at `/media-stream`,
//! delivering JSON `start` / `media` / `stop` events:
//! - `protocol`: typed media events plus the audio frame decoder
//! - `stream`: the per-connection lifecycle controller that opens the two
//!   recognition sessions, routes decoded frames, and guarantees teardown

mod protocol;
mod stream;

pub use protocol::{MediaEvent, MediaFrame, StartFrame};
pub use stream::{handle_media_socket, CallStreamController};
