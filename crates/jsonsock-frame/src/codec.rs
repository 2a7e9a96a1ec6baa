use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FrameError, Result};

/// Frame header: a single u32 payload length.
pub const HEADER_SIZE: usize = 4;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Largest payload the 4-byte header can describe.
pub const MAX_WIRE_PAYLOAD: usize = u32::MAX as usize;

/// Byte order of the length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    /// Network byte order.
    #[default]
    Big,
    Little,
}

impl Endianness {
    /// Encode a payload length as header bytes.
    pub fn header(self, len: u32) -> [u8; HEADER_SIZE] {
        match self {
            Endianness::Big => len.to_be_bytes(),
            Endianness::Little => len.to_le_bytes(),
        }
    }

    /// Human-readable name, for logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Endianness::Big => "big-endian",
            Endianness::Little => "little-endian",
        }
    }
}

/// Serialize a value to the JSON payload bytes (no header).
pub fn encode_payload<M: Serialize + ?Sized>(value: &M) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(FrameError::Serialize)
}

/// Serialize a value into a complete frame (header + payload).
pub fn encode<M: Serialize + ?Sized>(value: &M, endianness: Endianness) -> Result<Bytes> {
    let payload = encode_payload(value)?;
    let mut dst = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame(&payload, endianness, &mut dst)?;
    Ok(dst.freeze())
}

/// Append the wire form of `payload` to `dst`.
pub fn encode_frame(payload: &[u8], endianness: Endianness, dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_WIRE_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_WIRE_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&endianness.header(payload.len() as u32));
    dst.put_slice(payload);
    Ok(())
}

/// Interpret four header bytes as a payload length.
///
/// Every bit pattern is a valid length.
pub fn decode_header(header: [u8; HEADER_SIZE], endianness: Endianness) -> u32 {
    match endianness {
        Endianness::Big => u32::from_be_bytes(header),
        Endianness::Little => u32::from_le_bytes(header),
    }
}

/// Parse a complete payload as JSON.
///
/// Invalid UTF-8 and malformed JSON both surface as [`FrameError::Deserialize`].
pub fn decode_payload<M: DeserializeOwned>(payload: &[u8]) -> Result<M> {
    serde_json::from_slice(payload).map_err(FrameError::Deserialize)
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// The declared length is checked against `max_payload` as soon as the header
/// is available, before any payload bytes are awaited. On success, consumes
/// the frame bytes from the buffer.
pub fn decode_frame(
    src: &mut BytesMut,
    endianness: Endianness,
    max_payload: usize,
) -> Result<Option<Bytes>> {
    let Some(payload_len) = peek_length(src, endianness) else {
        return Ok(None);
    };

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Declared payload length of the frame at the front of `src`, if the header
/// has fully arrived.
pub(crate) fn peek_length(src: &[u8], endianness: Endianness) -> Option<usize> {
    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(src.get(..HEADER_SIZE)?);
    Some(decode_header(header, endianness) as usize)
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes, applied on both send and receive.
    /// Default: 16 MiB.
    pub max_payload_size: usize,
    /// Byte order used when a call does not specify one. Default: big-endian.
    pub endianness: Endianness,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            endianness: Endianness::Big,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
