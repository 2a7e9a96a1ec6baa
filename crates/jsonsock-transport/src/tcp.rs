use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::NetStream;

/// Default listen backlog: one pending connection.
pub const DEFAULT_BACKLOG: i32 = 1;

/// Listening TCP transport.
///
/// Provides bind/accept over TCP, plus the client-side [`TcpTransport::connect`].
/// The listening socket is closed when this value is dropped.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
    backlog: i32,
}

impl TcpTransport {
    /// Bind and listen with [`DEFAULT_BACKLOG`].
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::bind_with_backlog(addr, DEFAULT_BACKLOG)
    }

    /// Bind and listen with an explicit connection backlog.
    ///
    /// Every resolved address is tried in order; the first one that binds wins.
    pub fn bind_with_backlog(addr: impl ToSocketAddrs, backlog: i32) -> Result<Self> {
        let addrs = resolve(addr).map_err(|source| TransportError::Bind {
            addr: "<unresolved>".to_string(),
            source,
        })?;

        let mut last_err = None;
        for candidate in addrs {
            match TcpListener::bind(candidate) {
                Ok(listener) => {
                    apply_backlog(&listener, backlog).map_err(|source| {
                        TransportError::Bind {
                            addr: candidate.to_string(),
                            source,
                        }
                    })?;
                    let local_addr = listener.local_addr().map_err(|source| {
                        TransportError::Bind {
                            addr: candidate.to_string(),
                            source,
                        }
                    })?;

                    info!(%local_addr, backlog, "listening on tcp socket");

                    return Ok(Self {
                        listener,
                        local_addr,
                        backlog,
                    });
                }
                Err(source) => last_err = Some((candidate, source)),
            }
        }

        Err(match last_err {
            Some((addr, source)) => TransportError::Bind {
                addr: addr.to_string(),
                source,
            },
            None => TransportError::Bind {
                addr: "<unresolved>".to_string(),
                source: no_addresses(),
            },
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<NetStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(NetStream::from_tcp(stream))
    }

    /// Connect to a listening TCP socket (blocking).
    pub fn connect(addr: impl ToSocketAddrs) -> Result<NetStream> {
        Self::connect_timeout(addr, None)
    }

    /// Connect with an optional per-address timeout.
    ///
    /// Every resolved address is tried in order; the first successful
    /// connection wins and the last failure is reported otherwise.
    pub fn connect_timeout(
        addr: impl ToSocketAddrs,
        timeout: Option<Duration>,
    ) -> Result<NetStream> {
        let addrs = resolve(addr).map_err(|source| TransportError::Connect {
            addr: "<unresolved>".to_string(),
            source,
        })?;

        let mut last_err = None;
        for candidate in addrs {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
                None => TcpStream::connect(candidate),
            };
            match attempt {
                Ok(stream) => {
                    debug!(peer = %candidate, "connected to tcp socket");
                    return Ok(NetStream::from_tcp(stream));
                }
                Err(source) => last_err = Some((candidate, source)),
            }
        }

        Err(match last_err {
            Some((addr, source)) => TransportError::Connect {
                addr: addr.to_string(),
                source,
            },
            None => TransportError::Connect {
                addr: "<unresolved>".to_string(),
                source: no_addresses(),
            },
        })
    }

    /// The address this socket is bound to (useful after binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The backlog requested at bind time.
    pub fn backlog(&self) -> i32 {
        self.backlog
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("local_addr", &self.local_addr)
            .field("backlog", &self.backlog)
            .finish()
    }
}

fn resolve(addr: impl ToSocketAddrs) -> std::io::Result<Vec<SocketAddr>> {
    Ok(addr.to_socket_addrs()?.collect())
}

fn no_addresses() -> std::io::Error {
    std::io::Error::new(
        ErrorKind::InvalidInput,
        "address did not resolve to any socket address",
    )
}

/// std always listens with its own backlog; re-issuing `listen` on an already
/// listening socket updates the queue length on Unix.
#[cfg(unix)]
fn apply_backlog(listener: &TcpListener, backlog: i32) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    // SAFETY: `listener` owns an open, bound and listening socket descriptor
    // for the duration of this call.
    let rc = unsafe { libc::listen(listener.as_raw_fd(), backlog.max(0)) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn apply_backlog(_listener: &TcpListener, _backlog: i32) -> std::io::Result<()> {
    Ok(())
}
