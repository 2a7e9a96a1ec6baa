use jsonsock_frame::FrameError;
use jsonsock_transport::TransportError;

/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The operation needs an active session and there is none.
    #[error("not connected: {0}")]
    NotConnected(&'static str),
}

/// Coarse classification of an [`EndpointError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Binding or listening failed.
    Bind,
    /// Opening an outbound connection failed.
    Connect,
    /// No active session.
    NotConnected,
    /// I/O failure, premature close, or a frame the receiver refuses.
    /// The session should be treated as unusable.
    Transport,
    /// The value has no JSON representation.
    Serialization,
    /// The received payload is not valid JSON. The session stays usable.
    Deserialization,
}

impl EndpointError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EndpointError::Transport(TransportError::Bind { .. }) => ErrorKind::Bind,
            EndpointError::Transport(TransportError::Connect { .. }) => ErrorKind::Connect,
            EndpointError::Transport(_) => ErrorKind::Transport,
            EndpointError::Frame(FrameError::Serialize(_)) => ErrorKind::Serialization,
            EndpointError::Frame(FrameError::Deserialize(_)) => ErrorKind::Deserialization,
            EndpointError::Frame(_) => ErrorKind::Transport,
            EndpointError::NotConnected(_) => ErrorKind::NotConnected,
        }
    }

    /// True when the peer went away (EOF before a complete frame).
    pub fn is_disconnect(&self) -> bool {
        matches!(self, EndpointError::Frame(FrameError::ConnectionClosed))
    }
}

pub type Result<T> = std::result::Result<T, EndpointError>;
