use bytes::Bytes;

use chatwire_session::{ChatClient, Event};

use crate::cmd::SendArgs;
use crate::exit::{session_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_unknown_recipient, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    super::validate_name(&args.name)?;
    let mut client = ChatClient::connect(&args.addr, args.name.into_bytes())
        .map_err(|err| session_error("connect failed", err))?;

    if args.broadcast {
        client
            .send_broadcast(args.text.as_bytes())
            .map_err(|err| session_error("broadcast failed", err))?;
    } else {
        let recipients: Vec<Bytes> = args
            .to
            .unwrap_or_default()
            .into_iter()
            .map(|name| Bytes::from(name.into_bytes()))
            .collect();
        client
            .send_message(&recipients, args.text.as_bytes())
            .map_err(|err| session_error("send failed", err))?;
    }

    // The exit ack doubles as a delivery barrier: the server routes
    // frames in arrival order, so any unknown-recipient bounce for the
    // message precedes it.
    client
        .send_exit()
        .map_err(|err| session_error("exit failed", err))?;

    let mut bounced = false;
    loop {
        match client
            .next_event()
            .map_err(|err| session_error("receive failed", err))?
        {
            Event::UnknownRecipient { name } => {
                bounced = true;
                print_unknown_recipient(&name, format);
            }
            Event::ExitAcknowledged => {
                return Ok(if bounced { FAILURE } else { SUCCESS });
            }
            Event::ServerClosed => {
                return Err(CliError::new(FAILURE, "server closed before exit ack"));
            }
            // Inbound chat addressed to a one-shot sender is dropped.
            Event::Message { .. } | Event::Broadcast { .. } => {}
            other => {
                return Err(CliError::new(
                    INTERNAL,
                    format!("unexpected reply: {other:?}"),
                ))
            }
        }
    }
}
