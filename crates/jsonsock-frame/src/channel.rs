//! One-shot message send/receive over any byte stream.
//!
//! These wrap a [`FrameWriter`]/[`FrameReader`] around a borrowed stream for
//! the duration of a single call. Because the reader never consumes bytes past
//! the frame it returns, consecutive calls on the same stream stay aligned on
//! frame boundaries.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Endianness, FrameConfig};
use crate::error::Result;
use crate::reader::FrameReader;
use crate::writer::FrameWriter;

/// Serialize `value` and write the complete frame to `transport`.
pub fn send_message<W, M>(transport: &mut W, value: &M, endianness: Endianness) -> Result<()>
where
    W: Write + ?Sized,
    M: Serialize + ?Sized,
{
    send_message_with_config(transport, value, endianness, &FrameConfig::default())
}

/// [`send_message`] with an explicit size limit and write-timeout policy.
pub fn send_message_with_config<W, M>(
    transport: &mut W,
    value: &M,
    endianness: Endianness,
    config: &FrameConfig,
) -> Result<()>
where
    W: Write + ?Sized,
    M: Serialize + ?Sized,
{
    FrameWriter::with_config(transport, config.clone()).send_with(value, endianness)
}

/// Read exactly one frame from `transport` and parse it as JSON.
pub fn receive_message<R, M>(transport: &mut R, endianness: Endianness) -> Result<M>
where
    R: Read + ?Sized,
    M: DeserializeOwned,
{
    receive_message_with_config(transport, endianness, &FrameConfig::default())
}

/// [`receive_message`] with an explicit size limit.
pub fn receive_message_with_config<R, M>(
    transport: &mut R,
    endianness: Endianness,
    config: &FrameConfig,
) -> Result<M>
where
    R: Read + ?Sized,
    M: DeserializeOwned,
{
    FrameReader::with_config(transport, config.clone()).recv_with(endianness)
}
