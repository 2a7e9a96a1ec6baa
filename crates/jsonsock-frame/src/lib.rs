//! Length-prefixed JSON message framing.
//!
//! This is the core of jsonsock. Every message is a UTF-8 JSON document
//! preceded by its byte length:
//!
//! ```text
//! ┌───────────────────────┬──────────────────────────┐
//! │ Length (4B, u32)      │ Payload (Length bytes)   │
//! │ big- or little-endian │ UTF-8 JSON text          │
//! └───────────────────────┴──────────────────────────┘
//! ```
//!
//! The byte order is chosen per call and is never negotiated; both ends
//! must agree on it. Readers accumulate partial reads until a frame is
//! complete and never consume bytes past the end of the current frame.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod channel;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use channel::{
    receive_message, receive_message_with_config, send_message, send_message_with_config,
};
pub use codec::{
    decode_frame, decode_header, decode_payload, encode, encode_frame, encode_payload,
    Endianness, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAX_WIRE_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
