use std::fmt;
use std::io;

use chatwire_frame::FrameError;
use chatwire_session::SessionError;
use chatwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const NAME_TAKEN: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
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

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => FAILURE,
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::NameTooLong { .. }
        | FrameError::MessageTooLong { .. }
        | FrameError::FrameTooLarge { .. }
        | FrameError::Malformed(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::ConnectionClosed | FrameError::ShortRead => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::Io(err) => io_error(context, err),
        SessionError::HandleInUse => CliError::new(NAME_TAKEN, "Handle already in use"),
        SessionError::Disconnected(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
