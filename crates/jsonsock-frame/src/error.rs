use jsonsock_transport::TransportError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The value could not be represented as JSON.
    #[error("value is not JSON-serializable: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The payload was not valid UTF-8 JSON text.
    #[error("payload is not valid JSON: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was transferred.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl From<TransportError> for FrameError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
            TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
                FrameError::Io(source)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
