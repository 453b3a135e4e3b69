//! `chatsim`: line-mode demo of the simulated chat widget.
//!
//! Opens a room backed by the JSON fixtures, reads commands and messages
//! from stdin, and prints the conversation (including scripted
//! auto-replies) to stdout. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/chatsim/config.toml`).
//!
//! ```bash
//! # Dummy room from ./fixtures
//! cargo run --bin chatsim
//!
//! # Extended room, verbose logs to a file
//! cargo run --bin chatsim -- --room-source extended \
//!     --log-level debug --log-file /tmp/chatsim.log
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use chatsim::chat::host::InMemoryRoomHost;
use chatsim::chat::search::MessageSearch;
use chatsim::chat::staging::FileStaging;
use chatsim::chat::{ChatEvent, ChatSession};
use chatsim::config::{CliArgs, ClientConfig};
use chatsim::fixtures::DirFixtureSource;
use chatsim::reply::AutoReplyScheduler;
use chatsim_proto::message::Message;
use chatsim_proto::room::{DataSource, Room};

type Session = ChatSession<InMemoryRoomHost, DirFixtureSource>;

const HELP: &str = "\
commands:
  <text>                         send a message (with the staged file, if any)
  /attach <path> <mime>          stage a file
  /cancel                        drop the staged file
  /search <query>                search the open room
  /next, /prev                   move between search hits
  /room <id> <source> [user] [name]  open a room (source: new-chat, dummy, extended)
  /help                          show this help
  /quit                          exit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let fixtures = DirFixtureSource::new(config.fixtures_dir.clone());
    tracing::info!(fixtures = %fixtures.root().display(), "chatsim starting");

    let scheduler = Arc::new(AutoReplyScheduler::new(config.to_reply_timing()));
    let (session, events) = ChatSession::new(
        Arc::new(InMemoryRoomHost::new()),
        fixtures,
        scheduler,
        config.to_session_config(),
    );

    session.open_room(initial_room(config.room_source)).await;

    let result = run(&session, events).await;
    tracing::info!("chatsim exiting");
    result
}

/// Initialize logging.
///
/// Logs go to `file_path` when given, stderr otherwise (stdout carries the
/// conversation). Returns a [`WorkerGuard`] that must be held until
/// shutdown to ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> WorkerGuard {
    let (non_blocking, guard) = match file_path.and_then(split_log_path) {
        Some((dir, name)) => {
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name))
        }
        None => tracing_appender::non_blocking(io::stderr()),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    guard
}

fn split_log_path(path: &Path) -> Option<(&Path, &str)> {
    let name = path.file_name()?.to_str()?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some((dir, name))
}

fn initial_room(source: DataSource) -> Room {
    match source {
        DataSource::NewChat => {
            Room::new("new-chat", source).with_counterpart("support@mail.com", "Support")
        }
        _ => Room::new(source.as_str(), source),
    }
}

/// Reads stdin line by line while printing session events as they arrive.
async fn run(session: &Session, mut events: mpsc::Receiver<ChatEvent>) -> io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut staging = FileStaging::new();
    let mut search = MessageSearch::new();

    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                if !handle_line(session, &mut staging, &mut search, line.trim_end()).await {
                    return Ok(());
                }
            }
            Some(event) = events.recv() => print_event(session, &event),
        }
    }
}

/// Applies one input line. Returns `false` when the user asked to quit.
async fn handle_line(
    session: &Session,
    staging: &mut FileStaging,
    search: &mut MessageSearch,
    line: &str,
) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "/quit" => return false,
        "/help" => println!("{HELP}"),
        "/attach" => {
            let Some((path, mime)) = rest.rsplit_once(' ') else {
                println!("usage: /attach <path> <mime>");
                return true;
            };
            match staging.stage_path(Path::new(path), mime).await {
                Ok(()) => println!("staged: {}", staging.display_text("")),
                Err(e) => println!("cannot stage file: {e}"),
            }
        }
        "/cancel" => {
            staging.cancel();
            println!("staging cleared");
        }
        "/search" => {
            search.set_query(rest, &session.messages());
            match search.current() {
                Some(hit) => println!(
                    "{} match(es); 1: #{} {}",
                    search.results().len(),
                    hit.index,
                    hit.message.message
                ),
                None => println!("no matches"),
            }
        }
        "/next" | "/prev" => {
            let index = if command == "/next" {
                search.next_match()
            } else {
                search.prev_match()
            };
            match (index, search.current(), search.cursor()) {
                (Some(index), Some(hit), Some(cursor)) => println!(
                    "{}/{}: #{index} {}",
                    cursor + 1,
                    search.results().len(),
                    hit.message.message
                ),
                _ => println!("no matches"),
            }
        }
        "/room" => {
            let mut args = rest.split_whitespace();
            let (Some(id), Some(source)) = (args.next(), args.next()) else {
                println!("usage: /room <id> <source> [user] [name]");
                return true;
            };
            let mut room = Room::new(id, DataSource::from_tag(source));
            if let Some(user) = args.next() {
                let name = args.collect::<Vec<_>>().join(" ");
                room = room.with_counterpart(user, if name.is_empty() { user } else { name.as_str() });
            }
            search.reset();
            staging.cancel();
            session.open_room(room).await;
        }
        _ if command.starts_with('/') => println!("unknown command {command}, try /help"),
        _ => {
            if session.send_staged(line, staging).is_none() {
                tracing::debug!("nothing to send");
            }
        }
    }
    true
}

fn print_event(session: &Session, event: &ChatEvent) {
    match event {
        ChatEvent::RoomLoaded {
            room_id,
            message_count,
        } => {
            println!("-- room {room_id}: {message_count} message(s)");
            print_history(session);
        }
        ChatEvent::MessageAppended { message, .. } => print_message(session, message),
        ChatEvent::TypingStarted { sender, .. } => {
            println!("   {} is typing...", session.participant_name(sender));
        }
        ChatEvent::TypingStopped { .. } => {}
        ChatEvent::DeliveredElsewhere { room_id, message } => {
            println!("-- new reply in {room_id}: {}", message.message);
        }
    }
}

fn print_history(session: &Session) {
    for message in session.messages() {
        print_message(session, &message);
    }
}

fn print_message(session: &Session, message: &Message) {
    let attachment = message
        .attachment
        .as_ref()
        .map(|a| format!(" [📎 {} {}]", a.file_name, a.mime_type))
        .unwrap_or_default();
    println!(
        "[{}] {}: {}{attachment}",
        format_timestamp(&message.timestamp),
        session.participant_name(&message.sender),
        message.message
    );
}

/// Format an ISO-8601 timestamp as local "HH:MM".
fn format_timestamp(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp).map_or_else(
        |_| "??:??".to_string(),
        |dt| dt.with_timezone(&chrono::Local).format("%H:%M").to_string(),
    )
}
