use thiserror::Error;

/// Errors produced by the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] chatwire_transport::TransportError),

    #[error(transparent)]
    Frame(#[from] chatwire_frame::FrameError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The requested handle is already registered with the server.
    #[error("handle already in use")]
    HandleInUse,

    /// The peer sent a frame kind that is not valid in the current state.
    #[error("unexpected {0} frame")]
    UnexpectedFrame(&'static str),

    /// The server closed the connection without completing the exchange.
    #[error("disconnected: {0}")]
    Disconnected(String),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
