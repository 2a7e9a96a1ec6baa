use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use jsonsock_frame::{Endianness, FrameConfig};
use jsonsock_transport::TcpTransport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{EndpointError, Result};
use crate::session::Session;

/// Configuration for a [`Connector`].
#[derive(Debug, Clone, Default)]
pub struct ConnectorConfig {
    /// Per-address connect timeout. `None` blocks until the OS gives up.
    pub connect_timeout: Option<Duration>,
    /// Framing limits, default byte order and socket timeouts.
    pub frame: FrameConfig,
}

/// Connecting endpoint holding at most one outbound session.
#[derive(Default)]
pub struct Connector {
    session: Option<Session>,
    config: ConnectorConfig,
}

impl Connector {
    /// Create an unconnected endpoint with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unconnected endpoint with explicit configuration.
    pub fn with_config(config: ConnectorConfig) -> Self {
        Self {
            session: None,
            config,
        }
    }

    /// Create an endpoint and connect it in one step.
    pub fn connect_to(addr: impl ToSocketAddrs) -> Result<Self> {
        let mut connector = Self::new();
        connector.connect(addr)?;
        Ok(connector)
    }

    /// Open a connection, closing any existing one first.
    pub fn connect(&mut self, addr: impl ToSocketAddrs) -> Result<&mut Self> {
        self.close();

        let stream = TcpTransport::connect_timeout(addr, self.config.connect_timeout)?;
        let session = Session::open(stream, &self.config.frame)?;
        debug!(peer = ?session.peer_addr(), "connector session established");
        self.session = Some(session);
        Ok(self)
    }

    /// Send a message using the configured byte order.
    pub fn send<M: Serialize + ?Sized>(&mut self, value: &M) -> Result<()> {
        let endianness = self.config.frame.endianness;
        self.send_with(value, endianness)
    }

    /// Send a message.
    pub fn send_with<M: Serialize + ?Sized>(
        &mut self,
        value: &M,
        endianness: Endianness,
    ) -> Result<()> {
        self.session_mut()?.send(value, endianness)
    }

    /// Receive one message using the configured byte order.
    pub fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        let endianness = self.config.frame.endianness;
        self.recv_with(endianness)
    }

    /// Receive one message.
    pub fn recv_with<M: DeserializeOwned>(&mut self, endianness: Endianness) -> Result<M> {
        self.session_mut()?.recv(endianness)
    }

    /// Close the connection. Idempotent.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(peer = ?session.peer_addr(), "connector closed");
            session.close();
        }
    }

    /// True while connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Address of the remote end, if connected.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.session.as_ref().and_then(Session::peer_addr)
    }

    /// Current configuration.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(EndpointError::NotConnected(
            "connect must succeed before sending or receiving",
        ))
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("peer_addr", &self.peer_addr())
            .field("config", &self.config)
            .finish()
    }
}
