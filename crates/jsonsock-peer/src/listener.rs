use std::net::{SocketAddr, ToSocketAddrs};

use jsonsock_frame::{Endianness, FrameConfig};
use jsonsock_transport::{TcpTransport, DEFAULT_BACKLOG};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{EndpointError, Result};
use crate::session::Session;

/// Configuration for a [`Listener`].
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Pending-connection queue length passed to `listen`. Default: 1.
    pub backlog: i32,
    /// Framing limits, default byte order and socket timeouts for accepted peers.
    pub frame: FrameConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            backlog: DEFAULT_BACKLOG,
            frame: FrameConfig::default(),
        }
    }
}

/// Listening endpoint serving one peer at a time.
///
/// Accepting a new peer closes the previous one. Dropping the listener closes
/// both the active peer and the listening socket.
pub struct Listener {
    socket: Option<TcpTransport>,
    session: Option<Session>,
    local_addr: SocketAddr,
    config: ListenerConfig,
}

impl Listener {
    /// Bind with the default configuration.
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::bind_with_config(addr, ListenerConfig::default())
    }

    /// Bind and listen with explicit configuration.
    pub fn bind_with_config(addr: impl ToSocketAddrs, config: ListenerConfig) -> Result<Self> {
        let socket = TcpTransport::bind_with_backlog(addr, config.backlog)?;
        Ok(Self {
            local_addr: socket.local_addr(),
            socket: Some(socket),
            session: None,
            config,
        })
    }

    /// Block until a peer connects and make it the active session.
    ///
    /// Any previously connected peer is closed first. Returns `self` so a
    /// receive can be chained: `listener.accept()?.recv()`.
    pub fn accept(&mut self) -> Result<&mut Self> {
        let socket = self
            .socket
            .as_ref()
            .ok_or(EndpointError::NotConnected("listener is closed"))?;

        if let Some(previous) = self.session.take() {
            debug!(peer = ?previous.peer_addr(), "closing previous peer before accept");
            previous.close();
        }

        let stream = socket.accept()?;
        let session = Session::open(stream, &self.config.frame)?;
        debug!(peer = ?session.peer_addr(), "peer session established");
        self.session = Some(session);
        Ok(self)
    }

    /// Send a message to the active peer using the configured byte order.
    pub fn send<M: Serialize + ?Sized>(&mut self, value: &M) -> Result<()> {
        let endianness = self.config.frame.endianness;
        self.send_with(value, endianness)
    }

    /// Send a message to the active peer.
    pub fn send_with<M: Serialize + ?Sized>(
        &mut self,
        value: &M,
        endianness: Endianness,
    ) -> Result<()> {
        self.session_mut()?.send(value, endianness)
    }

    /// Receive one message from the active peer using the configured byte order.
    pub fn recv<M: DeserializeOwned>(&mut self) -> Result<M> {
        let endianness = self.config.frame.endianness;
        self.recv_with(endianness)
    }

    /// Receive one message from the active peer.
    pub fn recv_with<M: DeserializeOwned>(&mut self, endianness: Endianness) -> Result<M> {
        self.session_mut()?.recv(endianness)
    }

    /// Close the active peer but keep listening.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(peer = ?session.peer_addr(), "disconnecting peer");
            session.close();
        }
    }

    /// Close the active peer and the listening socket. Idempotent.
    pub fn close(&mut self) {
        self.disconnect();
        if self.socket.take().is_some() {
            debug!(local_addr = %self.local_addr, "listener closed");
        }
    }

    /// True while a peer session is active.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// True once [`Listener::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Address the listener is bound to (useful after binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Address of the active peer, if any.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.session.as_ref().and_then(Session::peer_addr)
    }

    /// Current configuration.
    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or(EndpointError::NotConnected("no peer is connected"))
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("local_addr", &self.local_addr)
            .field("peer_addr", &self.peer_addr())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::thread;
    use std::time::Duration;

    use jsonsock_frame::FrameWriter;
    use serde_json::{json, Value};

    use super::*;
    use crate::connector::Connector;
    use crate::error::ErrorKind;

    fn local_listener() -> Listener {
        Listener::bind("127.0.0.1:0").expect("listener should bind")
    }

    #[test]
    fn request_response_roundtrip() {
        let mut listener = local_listener();
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            let mut client = Connector::connect_to(addr).expect("client should connect");
            client
                .send(&json!({"name": "Daisy", "age": 24}))
                .expect("client should send");
            let reply: Value = client.recv().expect("client should receive reply");
            client.close();
            reply
        });

        let request: Value = listener
            .accept()
            .expect("listener should accept")
            .recv()
            .expect("listener should receive request");
        assert_eq!(request, json!({"name": "Daisy", "age": 24}));

        listener
            .send(&json!({"status": "ok"}))
            .expect("listener should reply");

        let reply = client.join().expect("client thread should finish");
        assert_eq!(reply, json!({"status": "ok"}));

        listener.close();
        assert!(listener.is_closed());
    }

    #[test]
    fn send_and_recv_require_a_peer() {
        let mut listener = local_listener();

        let err = listener.send(&json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);

        let err = listener.recv::<Value>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
        assert!(!listener.is_connected());
    }

    #[test]
    fn accept_replaces_previous_peer() {
        let mut listener = local_listener();
        let addr = listener.local_addr();

        let mut first = Connector::connect_to(addr).expect("first client should connect");
        listener.accept().expect("first accept should succeed");
        let first_addr = listener.peer_addr();

        let mut second = Connector::connect_to(addr).expect("second client should connect");
        listener.accept().expect("second accept should succeed");
        assert_ne!(listener.peer_addr(), first_addr);

        listener.send(&json!("for the second peer")).unwrap();
        let got: Value = second.recv().expect("second peer should receive");
        assert_eq!(got, json!("for the second peer"));

        let err = first.recv::<Value>().unwrap_err();
        assert!(err.is_disconnect());
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn malformed_payload_leaves_session_usable() {
        let mut listener = local_listener();
        let addr = listener.local_addr();

        let raw = TcpTransport::connect(addr).expect("raw client should connect");
        let mut writer = FrameWriter::new(raw);
        writer.send_payload(b"this is not json").unwrap();
        writer.send(&json!({"after": "garbage"})).unwrap();

        listener.accept().unwrap();
        let err = listener.recv::<Value>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Deserialization);

        let next: Value = listener.recv().expect("next frame should still decode");
        assert_eq!(next, json!({"after": "garbage"}));
    }

    #[test]
    fn little_endian_roundtrip() {
        let mut listener = local_listener();
        let mut client = Connector::connect_to(listener.local_addr()).unwrap();
        listener.accept().unwrap();

        client
            .send_with(&json!({"order": "little"}), Endianness::Little)
            .unwrap();
        let got: Value = listener.recv_with(Endianness::Little).unwrap();
        assert_eq!(got, json!({"order": "little"}));

        listener
            .send_with(&json!([1, 2, 3]), Endianness::Little)
            .unwrap();
        let back: Value = client.recv_with(Endianness::Little).unwrap();
        assert_eq!(back, json!([1, 2, 3]));
    }

    #[test]
    fn endianness_mismatch_fails() {
        let mut listener = local_listener();
        let mut client = Connector::connect_to(listener.local_addr()).unwrap();
        listener.accept().unwrap();

        client
            .send_with(&json!({"name": "Daisy", "age": 24}), Endianness::Little)
            .unwrap();
        let err = listener.recv_with::<Value>(Endianness::Big).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn oversized_frame_is_transport_error() {
        let config = ListenerConfig {
            frame: FrameConfig {
                max_payload_size: 8,
                ..FrameConfig::default()
            },
            ..ListenerConfig::default()
        };
        let mut listener = Listener::bind_with_config("127.0.0.1:0", config).unwrap();
        let mut client = Connector::connect_to(listener.local_addr()).unwrap();
        listener.accept().unwrap();

        client.send(&json!({"too": "large for eight bytes"})).unwrap();
        let err = listener.recv::<Value>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn peer_drop_surfaces_as_disconnect() {
        let mut listener = local_listener();
        {
            let _client = Connector::connect_to(listener.local_addr()).unwrap();
            listener.accept().unwrap();
        }

        let err = listener.recv::<Value>().unwrap_err();
        assert!(err.is_disconnect());
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let mut listener = local_listener();
        let addr = listener.local_addr();

        listener.close();
        listener.close();
        assert!(listener.is_closed());
        assert!(!listener.is_connected());

        let err = listener.accept().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);

        let err = Connector::connect_to(addr).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connect);
    }

    #[test]
    fn drop_releases_peer_and_socket() {
        let addr;
        let mut client;
        {
            let mut listener = local_listener();
            addr = listener.local_addr();
            client = Connector::connect_to(addr).unwrap();
            listener.accept().unwrap();
        }

        assert!(client.recv::<Value>().unwrap_err().is_disconnect());

        let err = Connector::connect_to(addr).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connect);
    }

    #[test]
    fn frame_trickled_byte_by_byte_over_tcp() {
        let mut listener = local_listener();
        let addr = listener.local_addr();
        let message = json!({"name": "Daisy", "age": 24, "u": "日本"});

        let wire = jsonsock_frame::encode(&message, Endianness::Little).unwrap();
        let writer = thread::spawn(move || {
            let mut raw = TcpTransport::connect(addr).expect("raw client should connect");
            for byte in wire.iter() {
                raw.write_all(std::slice::from_ref(byte)).unwrap();
                raw.flush().unwrap();
                thread::sleep(Duration::from_millis(2));
            }
            raw
        });

        let got: Value = listener
            .accept()
            .unwrap()
            .recv_with(Endianness::Little)
            .expect("trickled frame should reassemble");
        assert_eq!(got, message);

        let raw = writer.join().expect("writer thread should finish");
        raw.shutdown().expect("raw client should shut down cleanly");
        listener.close();
        assert!(listener.is_closed());
    }

    #[test]
    fn disconnect_keeps_listening() {
        let mut listener = local_listener();
        let addr = listener.local_addr();

        let mut first = Connector::connect_to(addr).unwrap();
        listener.accept().unwrap();
        listener.disconnect();
        assert!(!listener.is_connected());
        assert!(first.recv::<Value>().unwrap_err().is_disconnect());

        let mut second = Connector::connect_to(addr).unwrap();
        listener.accept().unwrap().send(&json!("hi")).unwrap();
        assert_eq!(second.recv::<Value>().unwrap(), json!("hi"));
    }

    #[test]
    fn bind_conflict_is_bind_error() {
        let listener = local_listener();
        let err = Listener::bind(listener.local_addr()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bind);
    }

    #[test]
    fn configured_backlog_is_kept() {
        let config = ListenerConfig {
            backlog: 16,
            ..ListenerConfig::default()
        };
        let listener = Listener::bind_with_config(("127.0.0.1", 0), config).unwrap();
        assert_eq!(listener.config().backlog, 16);
    }
}
