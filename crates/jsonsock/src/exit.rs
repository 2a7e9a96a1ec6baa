use std::fmt;
use std::io;

use jsonsock_frame::FrameError;
use jsonsock_peer::{EndpointError, ErrorKind};
use jsonsock_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrInUse => FAILURE,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => TRANSPORT_ERROR,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(err.kind()), format!("{context}: {err}"))
}

pub fn endpoint_error(context: &str, err: EndpointError) -> CliError {
    let code = match &err {
        EndpointError::Transport(
            TransportError::Bind { source, .. }
            | TransportError::Connect { source, .. }
            | TransportError::Accept(source)
            | TransportError::Io(source),
        ) => io_code(source.kind()),
        EndpointError::Frame(FrameError::Io(source)) => io_code(source.kind()),
        EndpointError::Frame(FrameError::PayloadTooLarge { .. }) => DATA_INVALID,
        EndpointError::Frame(FrameError::ConnectionClosed) => FAILURE,
        _ => match err.kind() {
            ErrorKind::Serialization | ErrorKind::Deserialization => DATA_INVALID,
            ErrorKind::Transport => TRANSPORT_ERROR,
            ErrorKind::NotConnected => INTERNAL,
            ErrorKind::Bind | ErrorKind::Connect => FAILURE,
        },
    };
    CliError::new(code, format!("{context}: {err}"))
}
