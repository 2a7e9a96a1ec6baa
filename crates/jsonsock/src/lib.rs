//! Length-prefixed JSON messages over TCP.
//!
//! jsonsock moves whole JSON documents between two endpoints. Each message is
//! sent as a 4-byte length (big-endian by default) followed by UTF-8 JSON.
//!
//! # Crate Structure
//!
//! - [`transport`]: Blocking TCP transport (bind, accept, connect)
//! - [`frame`]: Wire format, frame reader/writer, one-shot send/receive
//! - [`peer`]: Listening and connecting endpoints (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use jsonsock_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use jsonsock_frame::*;
}

/// Re-export endpoint types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use jsonsock_peer::*;
}
