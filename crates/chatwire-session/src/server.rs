use std::collections::BTreeMap;
use std::io::Write;
use std::net::{SocketAddr, ToSocketAddrs};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

use tracing::{debug, info, warn};

use chatwire_frame::{FrameReader, FrameWriter, Payload};
use chatwire_transport::{wait_readable, Connection, TcpAcceptor};

use crate::directory::{ClientDirectory, ClientHandle};
use crate::error::Result;
use crate::router::{route, RouteOutcome};

/// Wakes a running [`ChatServer`] out of its readiness loop.
///
/// Cheap to clone into signal handlers and other threads; dropping a
/// handle does not stop the server.
pub struct ShutdownHandle {
    wake_tx: UnixStream,
}

impl ShutdownHandle {
    /// Request shutdown. Idempotent; errors on the wake pipe are
    /// ignored since the server may already be gone.
    pub fn shutdown(&self) {
        let _ = (&self.wake_tx).write(&[0]);
    }

    pub fn try_clone(&self) -> std::io::Result<Self> {
        Ok(Self {
            wake_tx: self.wake_tx.try_clone()?,
        })
    }
}

struct Conn {
    reader: FrameReader<Connection>,
    writer: FrameWriter<Connection>,
}

/// Single-threaded chat server.
///
/// One readiness loop multiplexes the listener and every client
/// connection; each wakeup performs one unit of work — one accepted
/// connection or one routed frame — before polling again.
pub struct ChatServer {
    acceptor: TcpAcceptor,
    wake_rx: UnixStream,
    directory: ClientDirectory,
    conns: BTreeMap<ClientHandle, Conn>,
}

impl ChatServer {
    /// Bind the listening socket and build the shutdown wake pipe.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<(Self, ShutdownHandle)> {
        let acceptor = TcpAcceptor::bind(addr)?;
        let (wake_tx, wake_rx) = UnixStream::pair()?;
        info!(addr = %acceptor.local_addr(), "server listening");
        Ok((
            Self {
                acceptor,
                wake_rx,
                directory: ClientDirectory::new(),
                conns: BTreeMap::new(),
            },
            ShutdownHandle { wake_tx },
        ))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.acceptor.local_addr()
    }

    /// Run until a [`ShutdownHandle`] fires. Connections still open at
    /// shutdown are closed without a farewell frame; clients observe
    /// EOF.
    pub fn run(mut self) -> Result<()> {
        loop {
            // Frames already sitting in a read buffer produce no
            // readiness event, so drain one of those first.
            if let Some(handle) = self.buffered_conn() {
                self.service_conn(handle);
                continue;
            }

            let mut fds: Vec<RawFd> = Vec::with_capacity(2 + self.conns.len());
            fds.push(self.wake_rx.as_raw_fd());
            fds.push(self.acceptor.as_listener().as_raw_fd());
            let handles: Vec<ClientHandle> = self.conns.keys().copied().collect();
            for handle in &handles {
                fds.push(self.conns[handle].reader.get_ref().as_stream().as_raw_fd());
            }

            let ready = wait_readable(&fds)?;

            // One unit of work per wakeup; poll is level-triggered, so
            // other ready sources report again on the next iteration.
            if ready[0] {
                info!("shutdown requested");
                return Ok(());
            }
            if ready[1] {
                self.accept_one();
                continue;
            }
            if let Some(i) = ready[2..].iter().position(|r| *r) {
                self.service_conn(handles[i]);
            }
        }
    }

    fn buffered_conn(&self) -> Option<ClientHandle> {
        self.conns
            .iter()
            .find(|(_, conn)| conn.reader.has_buffered_frame())
            .map(|(handle, _)| *handle)
    }

    fn accept_one(&mut self) {
        let conn = match self.acceptor.accept() {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, "accept failed");
                return;
            }
        };
        let writer_half = match conn.try_clone() {
            Ok(clone) => clone,
            Err(err) => {
                warn!(error = %err, "dropping connection: clone failed");
                return;
            }
        };
        let handle = self.directory.allocate_handle();
        debug!(handle = handle.raw(), peer = ?conn.peer_addr().ok(), "connection accepted");
        self.conns.insert(
            handle,
            Conn {
                reader: FrameReader::new(conn),
                writer: FrameWriter::new(writer_half),
            },
        );
    }

    /// Read and route one frame from `handle`.
    fn service_conn(&mut self, handle: ClientHandle) {
        let Some(conn) = self.conns.get_mut(&handle) else {
            return;
        };

        let payload = conn
            .reader
            .read_frame()
            .and_then(|frame| Payload::from_frame(&frame));
        let payload = match payload {
            Ok(payload) => payload,
            Err(err) => {
                debug!(handle = handle.raw(), error = %err, "dropping connection");
                self.drop_conn(handle);
                return;
            }
        };

        match route(&mut self.directory, handle, payload) {
            Ok(RouteOutcome { sends, drop_origin }) => {
                for (target, payload) in sends {
                    self.send_to(target, &payload);
                }
                if drop_origin {
                    self.drop_conn(handle);
                }
            }
            Err(err) => {
                warn!(handle = handle.raw(), error = %err, "dropping connection");
                self.drop_conn(handle);
            }
        }
    }

    /// Write one payload to `target`, dropping the target on failure.
    /// A dead recipient never takes down the origin.
    fn send_to(&mut self, target: ClientHandle, payload: &Payload) {
        let Some(conn) = self.conns.get_mut(&target) else {
            return;
        };
        if let Err(err) = conn.writer.send(payload) {
            debug!(handle = target.raw(), error = %err, "write failed, dropping target");
            self.drop_conn(target);
        }
    }

    fn drop_conn(&mut self, handle: ClientHandle) {
        self.directory.unregister(handle);
        if self.conns.remove(&handle).is_some() {
            debug!(
                handle = handle.raw(),
                clients = self.directory.len(),
                "connection closed"
            );
        }
    }
}
