//! Tokio codec for the same wire format, for hosts that drive the protocol
//! from an async runtime.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Endianness, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// `tokio_util` codec yielding raw JSON payloads.
///
/// Pair with [`crate::decode_payload`] / [`crate::encode_payload`] to move
/// between payload bytes and typed values.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    endianness: Endianness,
    max_payload_size: usize,
}

impl FrameCodec {
    pub fn new(endianness: Endianness) -> Self {
        Self::with_config(&FrameConfig {
            endianness,
            ..FrameConfig::default()
        })
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            endianness: config.endianness,
            max_payload_size: config.max_payload_size,
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::with_config(&FrameConfig::default())
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        let frame = decode_frame(src, self.endianness, self.max_payload_size)?;
        if frame.is_none() && src.len() < HEADER_SIZE {
            src.reserve(HEADER_SIZE - src.len());
        }
        Ok(frame)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<()> {
        if payload.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload_size,
            });
        }
        encode_frame(&payload, self.endianness, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::codec::{decode_payload, encode, encode_payload};

    #[test]
    fn decoder_matches_blocking_encoder() {
        let mut codec = FrameCodec::new(Endianness::Little);
        let frame = encode(&json!({"async": true}), Endianness::Little).unwrap();

        let mut src = BytesMut::from(&frame[..3]);
        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(&frame[3..]);
        let payload = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(decode_payload::<Value>(&payload).unwrap(), json!({"async": true}));
    }

    #[test]
    fn eof_mid_frame_is_connection_closed() {
        let mut codec = FrameCodec::default();
        let mut src = BytesMut::from(&[0u8, 0, 0, 9, b'{'][..]);
        let err = codec.decode_eof(&mut src).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn encoder_enforces_limit() {
        let mut codec = FrameCodec::with_config(&FrameConfig {
            max_payload_size: 1,
            ..FrameConfig::default()
        });
        let mut dst = BytesMut::new();
        let err = codec.encode(Bytes::from_static(b"[]"), &mut dst).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(7);
        let mut sink = FramedWrite::new(client, FrameCodec::default());
        let mut stream = FramedRead::new(server, FrameCodec::default());

        let sent = json!({"name": "Daisy", "age": 24});
        let payload = Bytes::from(encode_payload(&sent).unwrap());
        let writer = tokio::spawn(async move {
            sink.send(payload).await.unwrap();
        });

        let received = stream.next().await.unwrap().unwrap();
        writer.await.unwrap();
        assert_eq!(decode_payload::<Value>(&received).unwrap(), sent);
    }
}
