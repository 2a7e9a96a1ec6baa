use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use jsonsock_transport::NetStream;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::codec::{
    decode_frame, decode_payload, peek_length, Endianness, FrameConfig, HEADER_SIZE,
};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// Each read asks only for the bytes the current frame still needs, so the
/// stream is never advanced past a frame boundary.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next frame payload using the configured byte order.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        self.read_frame_with(self.config.endianness)
    }

    /// Read the next frame payload (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached before
    /// the frame is complete, including EOF before any header byte.
    pub fn read_frame_with(&mut self, endianness: Endianness) -> Result<Bytes> {
        loop {
            match decode_frame(&mut self.buf, endianness, self.config.max_payload_size) {
                Ok(Some(payload)) => return Ok(payload),
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, endianness = endianness.as_str(), "rejecting frame");
                    self.buf.clear();
                    return Err(err);
                }
            }

            let wanted = self.remaining(endianness).min(READ_CHUNK_SIZE);
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk[..wanted]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next frame and parse it as JSON, using the configured byte order.
    pub fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        self.recv_with(self.config.endianness)
    }

    /// Read the next frame and parse it as JSON.
    ///
    /// A payload that fails to parse has still been consumed in full, so the
    /// following frame remains readable.
    pub fn recv_with<M: DeserializeOwned>(&mut self, endianness: Endianness) -> Result<M> {
        let payload = self.read_frame_with(endianness)?;
        decode_payload(&payload)
    }

    /// Bytes still missing from the frame currently being assembled.
    fn remaining(&self, endianness: Endianness) -> usize {
        match peek_length(&self.buf, endianness) {
            Some(len) => (HEADER_SIZE + len).saturating_sub(self.buf.len()),
            None => HEADER_SIZE - self.buf.len(),
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<NetStream> {
    /// Create a frame reader for `NetStream` and apply read timeout from config.
    pub fn with_config_net(inner: NetStream, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
