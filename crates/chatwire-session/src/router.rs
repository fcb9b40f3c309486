use bytes::Bytes;
use tracing::debug;

use chatwire_frame::Payload;

use crate::directory::{ClientDirectory, ClientHandle};
use crate::error::{Result, SessionError};

/// What the session loop must do after routing one inbound frame.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Replies and deliveries, in the order they must be written.
    pub sends: Vec<(ClientHandle, Payload)>,
    /// Close the originating connection once `sends` have been written.
    ///
    /// Set for exit requests and rejected handshakes; the ack or
    /// rejection is in `sends` and must go out before teardown.
    pub drop_origin: bool,
}

/// Route one decoded frame from client `from`.
///
/// Registration happens here; unregistration is left to the caller so
/// that queued replies reach the origin before its entry disappears.
/// An `Err` means the origin violated the protocol and must be dropped
/// without a reply.
pub fn route(
    dir: &mut ClientDirectory,
    from: ClientHandle,
    payload: Payload,
) -> Result<RouteOutcome> {
    let registered = dir.find_by_handle(from).cloned();

    match payload {
        Payload::HandshakeRequest { name } => {
            if registered.is_some() {
                return Err(SessionError::UnexpectedFrame("handshake-request"));
            }
            route_handshake(dir, from, name)
        }
        // Everything below requires a completed handshake.
        _ if registered.is_none() => Err(SessionError::UnexpectedFrame("pre-handshake")),
        Payload::Message {
            recipients, text, ..
        } => {
            let sender = registered.unwrap_or_default();
            route_message(dir, from, sender, recipients, text)
        }
        Payload::Broadcast { text, .. } => {
            let sender = registered.unwrap_or_default();
            Ok(route_broadcast(dir, from, sender, text))
        }
        Payload::ListRequest => Ok(route_list(dir, from)),
        Payload::ExitRequest => {
            debug!(handle = from.raw(), "client exiting");
            Ok(RouteOutcome {
                sends: vec![(from, Payload::ExitAck)],
                drop_origin: true,
            })
        }
        // Server-to-client kinds are never valid inbound.
        other => Err(SessionError::UnexpectedFrame(other.kind().name())),
    }
}

fn route_handshake(
    dir: &mut ClientDirectory,
    from: ClientHandle,
    name: Bytes,
) -> Result<RouteOutcome> {
    match dir.register(from, name) {
        Ok(()) => {
            debug!(handle = from.raw(), clients = dir.len(), "handshake accepted");
            Ok(RouteOutcome {
                sends: vec![(from, Payload::HandshakeOk)],
                drop_origin: false,
            })
        }
        Err(SessionError::HandleInUse) => {
            debug!(handle = from.raw(), "handshake rejected: name taken");
            Ok(RouteOutcome {
                sends: vec![(from, Payload::HandshakeRejected)],
                drop_origin: true,
            })
        }
        Err(other) => Err(other),
    }
}

fn route_message(
    dir: &ClientDirectory,
    from: ClientHandle,
    sender: Bytes,
    recipients: Vec<Bytes>,
    text: Bytes,
) -> Result<RouteOutcome> {
    let mut sends = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        match dir.find_by_name(&recipient) {
            // Delivered copies carry no recipient list; each target
            // only needs the sender and the text.
            Some(target) => sends.push((
                target,
                Payload::Message {
                    sender: sender.clone(),
                    recipients: Vec::new(),
                    text: text.clone(),
                },
            )),
            None => {
                debug!(handle = from.raw(), "recipient not found");
                sends.push((from, Payload::UnknownRecipient { name: recipient }));
            }
        }
    }
    Ok(RouteOutcome {
        sends,
        drop_origin: false,
    })
}

fn route_broadcast(
    dir: &ClientDirectory,
    from: ClientHandle,
    sender: Bytes,
    text: Bytes,
) -> RouteOutcome {
    let sends = dir
        .snapshot()
        .into_iter()
        .filter(|(handle, _)| *handle != from)
        .map(|(handle, _)| {
            (
                handle,
                Payload::Broadcast {
                    sender: sender.clone(),
                    text: text.clone(),
                },
            )
        })
        .collect();
    RouteOutcome {
        sends,
        drop_origin: false,
    }
}

fn route_list(dir: &ClientDirectory, from: ClientHandle) -> RouteOutcome {
    let snapshot = dir.snapshot();
    let mut sends = Vec::with_capacity(snapshot.len() + 1);
    sends.push((
        from,
        Payload::ListAck {
            count: snapshot.len() as u32,
        },
    ));
    for (_, name) in snapshot {
        sends.push((from, Payload::ListEntry { name }));
    }
    RouteOutcome {
        sends,
        drop_origin: false,
    }
}
