use chatwire_session::{ChatClient, Event};

use crate::cmd::ListArgs;
use crate::exit::{session_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_listing, OutputFormat};

pub fn run(args: ListArgs, format: OutputFormat) -> CliResult<i32> {
    // Listing requires a registered name; pick an unlikely-to-collide
    // one when the caller does not care.
    let name = args
        .name
        .unwrap_or_else(|| format!("list-{}", std::process::id()));
    super::validate_name(&name)?;

    let mut client = ChatClient::connect(&args.addr, name.into_bytes())
        .map_err(|err| session_error("connect failed", err))?;

    client
        .request_listing()
        .map_err(|err| session_error("list request failed", err))?;

    let names = loop {
        match client
            .next_event()
            .map_err(|err| session_error("receive failed", err))?
        {
            Event::Listing(names) => break names,
            Event::ServerClosed => {
                return Err(CliError::new(FAILURE, "server closed before listing"));
            }
            // Chat traffic may race the listing reply; ignore it.
            Event::Message { .. } | Event::Broadcast { .. } => {}
            other => {
                return Err(CliError::new(
                    INTERNAL,
                    format!("unexpected reply: {other:?}"),
                ))
            }
        }
    };

    print_listing(&names, format);

    client
        .send_exit()
        .map_err(|err| session_error("exit failed", err))?;
    loop {
        match client
            .next_event()
            .map_err(|err| session_error("receive failed", err))?
        {
            Event::ExitAcknowledged | Event::ServerClosed => return Ok(SUCCESS),
            _ => {}
        }
    }
}
