use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod chat;
pub mod list;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat server.
    Serve(ServeArgs),
    /// Join interactively and chat from the terminal.
    Chat(ChatArgs),
    /// Connect, deliver one message, and leave.
    Send(SendArgs),
    /// Print the connected clients.
    List(ListArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Chat(args) => chat::run(args),
        Command::Send(args) => send::run(args, format),
        Command::List(args) => list::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind, e.g. 127.0.0.1:7000. Port 0 picks a free port.
    #[arg(default_value = "127.0.0.1:0")]
    pub addr: String,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Server address to connect to.
    pub addr: String,
    /// Name to register under (up to 250 bytes).
    #[arg(long, short = 'n')]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Server address to connect to.
    pub addr: String,
    /// Name to register under.
    #[arg(long, short = 'n')]
    pub name: String,
    /// Recipient names (comma-separated).
    #[arg(long, value_delimiter = ',', required_unless_present = "broadcast")]
    pub to: Option<Vec<String>>,
    /// Send to every connected client instead of named recipients.
    #[arg(long, conflicts_with = "to")]
    pub broadcast: bool,
    /// Message text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Server address to connect to.
    pub addr: String,
    /// Name to register under while listing.
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Reject names that cannot be carried behind a single length byte
/// before any connection is made.
pub fn validate_name(name: &str) -> CliResult<()> {
    if name.len() > chatwire_frame::MAX_NAME {
        return Err(CliError::new(
            USAGE,
            format!(
                "name is {} bytes, max {}",
                name.len(),
                chatwire_frame::MAX_NAME
            ),
        ));
    }
    Ok(())
}
