/**
 * roomchat - Terminal Client Entry Point
 *
 * Enters one room, prints the timeline as it grows, and sends each stdin
 * line as a message. `/leave` or end of input leaves the room.
 *
 * Usage: roomchat <room-slug> [--config PATH]
 */
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use roomchat::client::{enter_room, Config, ConnectionState, Identity, RoomSnapshot};
use roomchat::shared::{AppConfig, Message, RoomId};

struct Args {
    room: RoomId,
    config: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let usage = "usage: roomchat <room-slug> [--config PATH]";
    let mut room = None;
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or_else(|| format!("--config needs a path\n{}", usage))?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Err(usage.to_string()),
            slug if room.is_none() => {
                room = Some(RoomId::new(slug).ok_or_else(|| format!("invalid room slug '{}'", slug))?);
            }
            other => return Err(format!("unexpected argument '{}'\n{}", other, usage)),
        }
    }

    Ok(Args {
        room: room.ok_or_else(|| usage.to_string())?,
        config,
    })
}

fn format_message(message: &Message, identity: &Identity) -> String {
    let marker = if message.is_authored_by(identity) { "*" } else { " " };
    format!(
        "[{}]{}{}: {}",
        message.timestamp.format("%H:%M:%S"),
        marker,
        message.author_name,
        message.body
    )
}

/// Prints whatever changed since the previous snapshot
struct Printer {
    identity: Identity,
    printed: usize,
    connection: Option<ConnectionState>,
    header: bool,
}

impl Printer {
    fn render(&mut self, snapshot: &RoomSnapshot) {
        if !self.header {
            if let Some(info) = &snapshot.room_info {
                println!("== {} ==", info.display_name());
                self.header = true;
            }
        }

        if self.connection != Some(snapshot.connection) {
            match snapshot.reconnect_attempt {
                Some(attempt) => println!("-- {} (reconnect attempt {}) --", snapshot.connection, attempt),
                None => println!("-- {} --", snapshot.connection),
            }
            self.connection = Some(snapshot.connection);
        }

        // the timeline only grows, so the unseen part is a suffix
        for message in snapshot.timeline.iter().skip(self.printed) {
            println!("{}", format_message(message, &self.identity));
        }
        self.printed = self.printed.max(snapshot.timeline.len());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let app = match &args.config {
        Some(path) => AppConfig::load(path)?.with_env_overrides()?,
        None => AppConfig::load_default()?,
    };
    let config = Config::from(app);
    let identity = config.identity().cloned().ok_or(roomchat::shared::SyncError::MissingIdentity)?;

    let mut handle = enter_room(&config, args.room)?;
    let mut printer = Printer {
        identity,
        printed: 0,
        connection: None,
        header: false,
    };
    printer.render(&handle.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = handle.changed() => {
                if !changed {
                    break;
                }
                printer.render(&handle.snapshot());
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim() == "/leave" => {
                    stdin_open = false;
                    handle.leave();
                }
                Ok(Some(line)) => {
                    if let Err(e) = handle.send(line).await {
                        eprintln!("not sent: {}", e);
                    }
                }
                Ok(None) => {
                    stdin_open = false;
                    handle.leave();
                }
                Err(e) => {
                    tracing::warn!("[ROOM] Could not read stdin: {}", e);
                    stdin_open = false;
                    handle.leave();
                }
            },
        }
    }

    handle.finished().await;
    Ok(())
}
