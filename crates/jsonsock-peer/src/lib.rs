//! Listening and connecting endpoints for JSON messages over TCP.
//!
//! This is the "just works" layer. A [`Listener`] serves one peer at a time,
//! a [`Connector`] dials one peer; both send and receive whole JSON messages.
//!
//! ```no_run
//! use jsonsock_peer::{Connector, Listener};
//! use serde_json::{json, Value};
//!
//! # fn main() -> jsonsock_peer::Result<()> {
//! let mut server = Listener::bind("127.0.0.1:9000")?;
//! let request: Value = server.accept()?.recv()?;
//! server.send(&json!({"status": "ok", "echo": request}))?;
//!
//! let mut client = Connector::connect_to("127.0.0.1:9000")?;
//! client.send(&json!({"name": "Daisy", "age": 24}))?;
//! let response: Value = client.recv()?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod connector;
pub mod error;
pub mod listener;
mod session;

pub use connector::{Connector, ConnectorConfig};
pub use error::{EndpointError, ErrorKind, Result};
pub use jsonsock_frame::{Endianness, FrameConfig};
pub use listener::{Listener, ListenerConfig};
