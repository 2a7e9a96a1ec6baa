use std::net::SocketAddr;

use jsonsock_frame::{Endianness, FrameConfig, FrameReader, FrameWriter};
use jsonsock_transport::NetStream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// One live connection: a reader half and a writer half over cloned handles
/// of the same stream.
pub(crate) struct Session {
    reader: FrameReader<NetStream>,
    writer: FrameWriter<NetStream>,
    peer_addr: Option<SocketAddr>,
}

impl Session {
    pub(crate) fn open(stream: NetStream, config: &FrameConfig) -> Result<Self> {
        let peer_addr = stream.peer_addr().ok();
        let reader_stream = stream.try_clone()?;

        let reader = FrameReader::with_config_net(reader_stream, config.clone())?;
        let writer = FrameWriter::with_config_net(stream, config.clone())?;

        Ok(Self {
            reader,
            writer,
            peer_addr,
        })
    }

    pub(crate) fn send<M: Serialize + ?Sized>(
        &mut self,
        value: &M,
        endianness: Endianness,
    ) -> Result<()> {
        self.writer.send_with(value, endianness)?;
        Ok(())
    }

    pub(crate) fn recv<M: DeserializeOwned>(&mut self, endianness: Endianness) -> Result<M> {
        Ok(self.reader.recv_with(endianness)?)
    }

    pub(crate) fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Shut the connection down so the remote end sees EOF even while cloned
    /// handles are still open. Never fails.
    pub(crate) fn close(&self) {
        if let Err(err) = self.writer.get_ref().shutdown() {
            debug!(peer = ?self.peer_addr, error = %err, "shutdown failed; dropping anyway");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
