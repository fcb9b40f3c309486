//! Multi-client text chat over TCP.
//!
//! chatwire is a small chat system built on length-prefixed binary
//! framing: a single-threaded server multiplexes every client on one
//! readiness loop, and clients exchange targeted messages, broadcasts,
//! and roster listings under server-enforced unique names.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP connections and readiness multiplexing
//! - [`frame`] — Wire framing and typed payloads
//! - [`session`] — Directory, routing, and the server/client loops

/// Re-export transport types.
pub mod transport {
    pub use chatwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use chatwire_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use chatwire_session::*;
}
