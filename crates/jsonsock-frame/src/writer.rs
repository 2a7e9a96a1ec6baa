use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use jsonsock_transport::NetStream;
use serde::Serialize;

use crate::codec::{encode_frame, encode_payload, Endianness, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// A send returns only once every byte of the frame has been accepted by the
/// stream and the stream has been flushed.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Serialize and send a message using the configured byte order.
    pub fn send<M: Serialize + ?Sized>(&mut self, value: &M) -> Result<()> {
        self.send_with(value, self.config.endianness)
    }

    /// Serialize and send a message (blocking).
    pub fn send_with<M: Serialize + ?Sized>(
        &mut self,
        value: &M,
        endianness: Endianness,
    ) -> Result<()> {
        let payload = encode_payload(value)?;
        self.send_payload_with(&payload, endianness)
    }

    /// Send pre-encoded payload bytes using the configured byte order.
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.send_payload_with(payload, self.config.endianness)
    }

    /// Frame and send pre-encoded payload bytes.
    ///
    /// The payload is not checked for being JSON.
    pub fn send_payload_with(&mut self, payload: &[u8], endianness: Endianness) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(payload, endianness, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if self.is_retryable(&err) => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if self.is_retryable(&err) => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// `WouldBlock` under a configured write timeout means the timeout fired.
    fn is_retryable(&self, err: &std::io::Error) -> bool {
        match err.kind() {
            ErrorKind::Interrupted => true,
            ErrorKind::WouldBlock => self.config.write_timeout.is_none(),
            _ => false,
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame encoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<NetStream> {
    /// Create a frame writer for `NetStream` and apply write timeout from config.
    pub fn with_config_net(inner: NetStream, config: FrameConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
