//! TCP stream transport and readiness multiplexing.
//!
//! This is the lowest layer of chatwire. It provides two things:
//! - [`TcpAcceptor`] / [`Connection`] — a thin, logged wrapper around TCP
//!   bind/accept/connect returning connected byte streams
//! - [`poll`] — a readiness primitive the session loops block on, so a
//!   single thread can wait on a listener, many connections, and local
//!   input at once

pub mod error;
pub mod tcp;

#[cfg(unix)]
pub mod poll;

pub use error::{Result, TransportError};
pub use tcp::{Connection, TcpAcceptor};

#[cfg(unix)]
pub use poll::wait_readable;
