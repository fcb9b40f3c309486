use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Listens for incoming chat connections on a TCP address.
pub struct TcpAcceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpAcceptor {
    /// Bind and listen on a TCP address (e.g. `127.0.0.1:0` for an
    /// OS-assigned port).
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let display = addr.to_string();
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: display.clone(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: display,
            source: e,
        })?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Connection> {
        let (stream, peer_addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer_addr, "accepted connection");
        Connection::from_stream(stream)
    }

    /// The address this acceptor is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Borrow the underlying listener (for readiness registration).
    pub fn as_listener(&self) -> &TcpListener {
        &self.listener
    }
}

/// A connected chat stream — implements Read + Write.
///
/// Wraps a `TcpStream` with `TCP_NODELAY` set, so small chat frames are
/// not held back by Nagle batching.
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// Connect to a listening chat server (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let display = addr.to_string();
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: display,
            source: e,
        })?;
        debug!(peer = %stream.peer_addr().map(|a| a.to_string()).unwrap_or_default(),
            "connected to chat server");
        Self::from_stream(stream)
    }

    /// Try to clone this connection (creates a new file descriptor).
    ///
    /// Used to hand independent reader and writer halves to the framing
    /// layer.
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.stream.try_clone()?;
        Ok(Self { stream: cloned })
    }

    /// Remote peer address.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }

    /// Borrow the underlying stream (for readiness registration).
    pub fn as_stream(&self) -> &TcpStream {
        &self.stream
    }

    /// Shut down both directions of the connection.
    pub fn shutdown(&self) -> Result<()> {
        self.stream.shutdown(std::net::Shutdown::Both)?;
        Ok(())
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.stream.peer_addr().ok())
            .finish()
    }
}
