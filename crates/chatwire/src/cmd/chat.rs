use std::io::{BufRead, Write};
use std::os::fd::AsRawFd;

use bytes::Bytes;

use chatwire_frame::FrameError;
use chatwire_session::{ChatClient, Event, SessionError};
use chatwire_transport::wait_readable;

use crate::cmd::ChatArgs;
use crate::exit::{session_error, CliResult, FAILURE, SUCCESS};
use crate::output::text_preview;

/// One line of user input, parsed.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Message { recipients: Vec<Bytes>, text: String },
    Broadcast { text: String },
    List,
    Exit,
    Invalid,
}

pub fn run(args: ChatArgs) -> CliResult<i32> {
    super::validate_name(&args.name)?;
    let mut client = match ChatClient::connect(&args.addr, args.name.clone().into_bytes()) {
        Ok(client) => client,
        Err(SessionError::HandleInUse) => {
            println!("Handle already in use: {}", args.name);
            return Ok(FAILURE);
        }
        Err(err) => return Err(session_error("connect failed", err)),
    };

    let stdin = std::io::stdin();
    let mut stdin_open = true;
    prompt();

    loop {
        // Frames already buffered on the client never trigger poll.
        // A closed stdin stays poll-ready forever, so once it hits EOF
        // it is dropped from the watched set and only the server
        // connection is polled until the exit ack arrives.
        let stdin_ready = if client.has_buffered_event() {
            false
        } else if stdin_open {
            let ready = wait_readable(&[stdin.as_raw_fd(), client.as_raw_fd()])
                .map_err(|err| session_error("poll failed", err.into()))?;
            if !ready[0] && !ready[1] {
                continue;
            }
            ready[0]
        } else {
            let ready = wait_readable(&[client.as_raw_fd()])
                .map_err(|err| session_error("poll failed", err.into()))?;
            if !ready[0] {
                continue;
            }
            false
        };

        if stdin_ready {
            let mut line = String::new();
            let n = stdin
                .lock()
                .read_line(&mut line)
                .map_err(|err| session_error("stdin read failed", err.into()))?;
            if n == 0 {
                // Terminal closed; leave politely and wait for the ack.
                stdin_open = false;
                client
                    .send_exit()
                    .map_err(|err| session_error("exit failed", err))?;
                continue;
            }
            dispatch(&mut client, parse_input(line.trim_end_matches('\n')))?;
        } else {
            let event = client
                .next_event()
                .map_err(|err| session_error("receive failed", err))?;
            match render_event(event) {
                Loop::Continue => prompt(),
                Loop::Quit(code) => return Ok(code),
            }
        }
    }
}

enum Loop {
    Continue,
    Quit(i32),
}

fn dispatch(client: &mut ChatClient, input: Input) -> CliResult<()> {
    // The exit ack, not the prompt, is what follows an exit request.
    let reprompt = !matches!(input, Input::Exit);
    let sent = match input {
        Input::Message { recipients, text } => client.send_message(&recipients, text.as_bytes()),
        Input::Broadcast { text } => client.send_broadcast(text.as_bytes()),
        Input::List => client.request_listing(),
        Input::Exit => client.send_exit(),
        Input::Invalid => {
            println!("Invalid Command");
            prompt();
            return Ok(());
        }
    };
    match sent {
        Ok(()) => {
            if reprompt {
                prompt();
            }
            Ok(())
        }
        // Frame-build failures (oversized handle, too many recipients)
        // are fatal only to the one frame being built; the session
        // stays up and the user gets another prompt.
        Err(SessionError::Frame(
            err @ (FrameError::NameTooLong { .. }
            | FrameError::MessageTooLong { .. }
            | FrameError::Malformed(_)),
        )) => {
            println!("Invalid Command: {err}");
            prompt();
            Ok(())
        }
        Err(err) => Err(session_error("send failed", err)),
    }
}

fn render_event(event: Event) -> Loop {
    match event {
        Event::Message { sender, text } | Event::Broadcast { sender, text } => {
            println!("\n{}: {}", text_preview(&sender), text_preview(&text));
            Loop::Continue
        }
        Event::UnknownRecipient { name } => {
            println!("Client with handle {} does not exist", text_preview(&name));
            Loop::Continue
        }
        Event::Listing(names) => {
            println!("\nNumber of clients: {}", names.len());
            for name in &names {
                println!("  {}", text_preview(name));
            }
            Loop::Continue
        }
        Event::ExitAcknowledged => Loop::Quit(SUCCESS),
        Event::ServerClosed => {
            println!("Server Terminated");
            Loop::Quit(FAILURE)
        }
    }
}

fn prompt() {
    print!("$: ");
    let _ = std::io::stdout().flush();
}

/// Grammar: `%m [count] <name>... <text>`, `%b <text>`, `%l`, `%e`.
/// A missing count means one recipient. Anything else is invalid.
fn parse_input(line: &str) -> Input {
    let mut rest = line.trim_start();
    let Some(cmd) = next_token(&mut rest) else {
        return Input::Invalid;
    };

    match cmd.to_ascii_lowercase().as_str() {
        "%m" => parse_message(rest),
        "%b" => Input::Broadcast {
            text: rest.to_string(),
        },
        "%l" if rest.is_empty() => Input::List,
        "%e" if rest.is_empty() => Input::Exit,
        _ => Input::Invalid,
    }
}

fn parse_message(mut rest: &str) -> Input {
    let Some(first) = next_token(&mut rest) else {
        return Input::Invalid;
    };

    // An integer first token is a recipient count; any other token is
    // the single recipient itself.
    let (count, mut pending) = match first.parse::<usize>() {
        Ok(0) => return Input::Invalid,
        Ok(n) => (n, None),
        Err(_) => (1, Some(first)),
    };

    let mut recipients = Vec::with_capacity(count);
    for _ in 0..count {
        let token = match pending.take() {
            Some(token) => token,
            None => match next_token(&mut rest) {
                Some(token) => token,
                None => return Input::Invalid,
            },
        };
        recipients.push(Bytes::copy_from_slice(token.as_bytes()));
    }

    Input::Message {
        recipients,
        text: rest.to_string(),
    }
}

/// Pop the next space-delimited token, advancing `rest` past it and the
/// separating spaces.
fn next_token<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start_matches(' ');
    if trimmed.is_empty() {
        *rest = trimmed;
        return None;
    }
    match trimmed.find(' ') {
        Some(at) => {
            let (token, tail) = trimmed.split_at(at);
            *rest = tail.trim_start_matches(' ');
            Some(token)
        }
        None => {
            *rest = "";
            Some(trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn message_without_count_is_single_recipient() {
        assert_eq!(
            parse_input("%m bob hello there"),
            Input::Message {
                recipients: vec![name("bob")],
                text: "hello there".to_string(),
            }
        );
    }

    #[test]
    fn message_with_count_gathers_recipients() {
        assert_eq!(
            parse_input("%m 3 bob carol dave lunch?"),
            Input::Message {
                recipients: vec![name("bob"), name("carol"), name("dave")],
                text: "lunch?".to_string(),
            }
        );
    }

    #[test]
    fn message_with_too_few_names_is_invalid() {
        assert_eq!(parse_input("%m 3 bob carol"), Input::Invalid);
    }

    #[test]
    fn message_with_zero_count_is_invalid() {
        assert_eq!(parse_input("%m 0 hello"), Input::Invalid);
    }

    #[test]
    fn uppercase_commands_accepted() {
        assert_eq!(
            parse_input("%B everyone hi"),
            Input::Broadcast {
                text: "everyone hi".to_string(),
            }
        );
        assert_eq!(parse_input("%L"), Input::List);
        assert_eq!(parse_input("%E"), Input::Exit);
    }

    #[test]
    fn broadcast_keeps_interior_spacing() {
        assert_eq!(
            parse_input("%b spaced   out"),
            Input::Broadcast {
                text: "spaced   out".to_string(),
            }
        );
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert_eq!(parse_input("%x whatever"), Input::Invalid);
        assert_eq!(parse_input("plain text"), Input::Invalid);
        assert_eq!(parse_input(""), Input::Invalid);
    }

    #[test]
    fn list_and_exit_take_no_arguments() {
        assert_eq!(parse_input("%l extra"), Input::Invalid);
        assert_eq!(parse_input("%e now"), Input::Invalid);
    }

    #[test]
    fn message_with_empty_text_is_allowed() {
        assert_eq!(
            parse_input("%m bob"),
            Input::Message {
                recipients: vec![name("bob")],
                text: String::new(),
            }
        );
    }

    #[test]
    fn frame_build_failure_keeps_the_session_alive() {
        let (server, shutdown) = chatwire_session::ChatServer::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr();
        let thread = std::thread::spawn(move || server.run());

        let mut client = ChatClient::connect(addr, &b"alice"[..]).unwrap();

        // Oversized handle fails while building the frame; nothing is
        // written and the session must survive.
        let oversized = "n".repeat(251);
        dispatch(&mut client, parse_input(&format!("%m {oversized} hi"))).unwrap();

        // The same connection still serves a listing request.
        dispatch(&mut client, parse_input("%l")).unwrap();
        assert!(matches!(
            client.next_event().unwrap(),
            Event::Listing(names) if names == vec![name("alice")]
        ));

        shutdown.shutdown();
        thread.join().unwrap().unwrap();
    }
}
