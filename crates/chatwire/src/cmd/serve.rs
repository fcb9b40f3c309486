use std::io::Write;

use chatwire_session::ChatServer;

use crate::cmd::ServeArgs;
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let (server, shutdown) =
        ChatServer::bind(&args.addr).map_err(|err| session_error("bind failed", err))?;

    // The bound address goes to stdout so scripts (and tests) can
    // discover the picked port; everything else logs to stderr.
    println!("listening on {}", server.local_addr());
    let _ = std::io::stdout().flush();

    ctrlc::set_handler(move || shutdown.shutdown()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })?;

    server
        .run()
        .map_err(|err| session_error("server failed", err))?;
    Ok(SUCCESS)
}
