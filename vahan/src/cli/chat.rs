//! Interactive chat prompt.
//!
//! Reads lines from stdin and socket events from the transport in one loop, so
//! agent replies are printed as soon as they arrive.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use url::Url;

use vahan::chat::{ChatLifecycle, Phase, WsTransport, SUGGESTIONS};
use vahan::error::ChatError;
use vahan::models::{Message, Sender};
use vahan::storage::{Storage, TOKEN_KEY};

/// One line of input at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    New,
    Load(&'a str),
    Close,
    History,
    /// `/suggest` alone lists the queries; with a number, sends one.
    Suggest(Option<usize>),
    Help,
    Quit,
    Send(&'a str),
    Empty,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> ReplCommand<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return ReplCommand::Send(line);
    };
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));
    match (name, arg) {
        ("new", _) => ReplCommand::New,
        ("load", id) if !id.is_empty() => ReplCommand::Load(id),
        ("close", _) => ReplCommand::Close,
        ("history", _) => ReplCommand::History,
        ("suggest", "") => ReplCommand::Suggest(None),
        ("suggest", n) => n
            .parse()
            .ok()
            .filter(|n| (1..=SUGGESTIONS.len()).contains(n))
            .map_or(ReplCommand::Unknown(trimmed), |n| ReplCommand::Suggest(Some(n))),
        ("help", _) => ReplCommand::Help,
        ("quit" | "exit", _) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(trimmed),
    }
}

enum Flow {
    Continue,
    Quit,
}

pub fn print_message(message: &Message) {
    let who = match message.sender {
        Sender::User => "YOU",
        Sender::Agent => "VAHAN",
    };
    println!(
        "[{who} {}] {}",
        message.timestamp.format("%H:%M"),
        message.content
    );
}

fn print_auth_required() {
    println!("Authentication Required");
    println!("Please log in to access the chat features and start your conversation.");
    println!("Run: vahan login --email <EMAIL>");
}

fn print_welcome() {
    println!("Welcome to Vahan Chatbot");
    println!("Your AI-powered assistant for all product-related queries");
    println!();
    println!("Type /new to start a conversation. Popular queries:");
    print_suggestions();
}

fn print_suggestions() {
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        println!("  {}. {suggestion}", i + 1);
    }
    println!("Send one with /suggest <n>.");
}

fn print_help() {
    println!("Commands:");
    println!("  /new            Start a new conversation");
    println!("  /load <ID>      Resume a conversation");
    println!("  /close          Close the current conversation");
    println!("  /history        Show the current conversation");
    println!("  /suggest [N]    List popular queries, or send query N");
    println!("  /help           Show this help");
    println!("  /quit           Exit");
    println!("Anything else is sent as a message.");
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

type Chat = ChatLifecycle<WsTransport>;

/// What the prompt shows before reading input.
#[derive(Debug, PartialEq, Eq)]
enum Opening<'a> {
    Welcome,
    Resume(&'a str),
    /// A session link opened while logged out: loaded without a token.
    SharedSession(&'a str),
    LoginRequired,
}

const fn opening(logged_in: bool, session: Option<&str>) -> Opening<'_> {
    match (logged_in, session) {
        (true, Some(id)) => Opening::Resume(id),
        (true, None) => Opening::Welcome,
        (false, Some(id)) => Opening::SharedSession(id),
        (false, None) => Opening::LoginRequired,
    }
}

pub async fn run(storage: Arc<dyn Storage>, ws_base: Url, session: Option<String>) -> Result<()> {
    let logged_in = storage.get(TOKEN_KEY)?.is_some_and(|t| !t.is_empty());
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut chat = ChatLifecycle::new(storage, WsTransport::new(events_tx), ws_base);

    match opening(logged_in, session.as_deref()) {
        Opening::LoginRequired => {
            print_auth_required();
            return Ok(());
        }
        Opening::Welcome => print_welcome(),
        Opening::SharedSession(id) => {
            print_auth_required();
            println!();
            resume(&mut chat, id)?;
        }
        Opening::Resume(id) => resume(&mut chat, id)?,
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if matches!(handle_line(&mut chat, &line)?, Flow::Quit) {
                    break;
                }
                prompt();
            }
            Some(envelope) = events_rx.recv() => {
                let seen = chat.state().messages().len();
                let phase = chat.state().phase();
                let error = chat.state().last_error().map(String::from);

                match chat.handle_event(envelope) {
                    Ok(()) => {}
                    Err(ChatError::AuthenticationRequired) => {
                        println!();
                        println!("Your session has expired.");
                        print_auth_required();
                        prompt();
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }

                let state = chat.state();
                if state.last_error() != error.as_deref() {
                    if let Some(reason) = state.last_error() {
                        eprintln!("Connection error: {reason}");
                    }
                }
                if phase != Phase::Idle && state.phase() == Phase::Idle && state.session().is_some() {
                    println!("Disconnected. New messages are kept locally; /load to reconnect.");
                }
                if state.messages().len() > seen {
                    println!();
                    state.messages()[seen..].iter().for_each(print_message);
                    prompt();
                }
            }
        }
    }

    chat.close_session()?;
    Ok(())
}

fn handle_line(chat: &mut Chat, line: &str) -> Result<Flow> {
    match parse_command(line) {
        ReplCommand::Empty => {}
        ReplCommand::Quit => return Ok(Flow::Quit),
        ReplCommand::Help => print_help(),
        ReplCommand::New => start_session(chat)?,
        ReplCommand::Load(id) => match chat.load_session(id) {
            Ok(id) => {
                println!("Loaded {id}");
                chat.state().messages().iter().for_each(print_message);
            }
            Err(ChatError::InvalidSessionId(_)) => println!("Invalid session ID: {id}"),
            Err(e) => return Err(e.into()),
        },
        ReplCommand::Close => {
            chat.close_session()?;
            println!("Conversation closed.");
            print_welcome();
        }
        ReplCommand::History => {
            if chat.state().session().is_none() {
                println!("No active conversation.");
            } else if chat.state().messages().is_empty() {
                println!("No messages yet.");
            } else {
                chat.state().messages().iter().for_each(print_message);
            }
        }
        ReplCommand::Suggest(None) => print_suggestions(),
        ReplCommand::Suggest(Some(n)) => {
            if chat.state().session().is_none() {
                start_session(chat)?;
            }
            let text = SUGGESTIONS[n - 1];
            println!("[YOU] {text}");
            send(chat, text)?;
        }
        ReplCommand::Send(text) => {
            if chat.state().session().is_none() {
                println!("No active conversation. Type /new to start one.");
            } else {
                send(chat, text)?;
            }
        }
        ReplCommand::Unknown(command) => {
            println!("Unknown command: {command}. Type /help for commands.");
        }
    }
    Ok(Flow::Continue)
}

fn resume(chat: &mut Chat, id: &str) -> Result<()> {
    let id = chat.load_session(id)?;
    println!("Resumed {id}");
    chat.state().messages().iter().for_each(print_message);
    Ok(())
}

fn start_session(chat: &mut Chat) -> Result<()> {
    match chat.create_session() {
        Ok(id) => {
            println!("Started {id}");
            Ok(())
        }
        Err(ChatError::AuthenticationRequired) => {
            print_auth_required();
            Ok(())
        }
        Err(e) => Err(e).context("Failed to start conversation"),
    }
}

fn send(chat: &mut Chat, text: &str) -> Result<()> {
    if chat.send_message(text)? && chat.state().is_awaiting_reply() {
        println!("Thinking...");
    }
    Ok(())
}
