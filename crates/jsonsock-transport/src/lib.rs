//! Blocking TCP byte-stream transport.
//!
//! This is the lowest layer of jsonsock. It knows nothing about frames or
//! JSON: it binds, accepts, connects, and hands out [`NetStream`] values that
//! implement `Read + Write`. Everything else builds on top of that.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::NetStream;
pub use tcp::{TcpTransport, DEFAULT_BACKLOG};
