//! Chat session layer.
//!
//! Builds the protocol's stateful pieces on top of `chatwire-frame` and
//! `chatwire-transport`: the [`ClientDirectory`] mapping names to live
//! connections, the pure [`route`] function that turns one inbound
//! frame into an ordered set of outbound sends, and the two session
//! loops — [`ChatServer`] multiplexing every connection on a single
//! thread, and [`ChatClient`] driving one connection for a caller.

pub mod client;
pub mod directory;
pub mod error;
pub mod router;
#[cfg(unix)]
pub mod server;

pub use client::{ChatClient, Event};
pub use directory::{ClientDirectory, ClientHandle};
pub use error::{Result, SessionError};
pub use router::{route, RouteOutcome};
#[cfg(unix)]
pub use server::{ChatServer, ShutdownHandle};
