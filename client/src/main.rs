use clap::Parser;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use client::game::SessionState;
use client::network::LobbyClient;
use shared::ServerMessage;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Lobby token to join, as returned by POST /lobby
    #[arg(short = 'l', long)]
    lobby: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    let mut client = LobbyClient::connect(&args.server, &args.lobby).await?;
    let mut session = SessionState::new();

    client.request_state().await?;

    println!("Joined lobby {}", args.lobby);
    println!("Commands: move ROW COL VALUE | clear ROW COL | state | quit");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            message = client.next_message() => {
                match message {
                    Some(message) => handle_server_message(&mut session, &message),
                    None => {
                        println!("Server closed the connection");
                        break;
                    }
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_command(&mut client, &session, line.trim()).await? {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    let _ = client.close().await;
    Ok(())
}

fn handle_server_message(session: &mut SessionState, message: &ServerMessage) {
    match message {
        ServerMessage::Success {
            row, col, value, ..
        } => {
            if *value == 0 {
                println!("Cleared ({}, {})", row, col);
            } else {
                println!("Placed {} at ({}, {})", value, row, col);
            }
        }
        ServerMessage::Error { error, .. } => {
            println!("Rejected: {}", error);
        }
        ServerMessage::State { .. } => {
            session.apply(message);
            print!("{}", session.board);
            if session.is_solved() {
                println!("Puzzle solved!");
            } else {
                println!("{} cells remaining", session.remaining());
            }
        }
    }
}

/// Returns `false` when the user asked to quit.
async fn handle_command(
    client: &mut LobbyClient,
    session: &SessionState,
    line: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [] => {}
        ["quit"] | ["exit"] => return Ok(false),
        ["state"] => client.request_state().await?,
        ["move", row, col, value] => match (row.parse(), col.parse(), value.parse()) {
            (Ok(row), Ok(col), Ok(value)) => client.send_move(row, col, value).await?,
            _ => println!("Usage: move ROW COL VALUE (all numeric)"),
        },
        ["clear", row, col] => match (row.parse(), col.parse()) {
            (Ok(row), Ok(col)) => {
                if session.is_given(row, col) {
                    println!("Cell ({}, {}) is part of the initial puzzle", row, col);
                } else {
                    client.send_clear(row, col).await?;
                }
            }
            _ => println!("Usage: clear ROW COL (both numeric)"),
        },
        _ => println!("Commands: move ROW COL VALUE | clear ROW COL | state | quit"),
    }
    Ok(true)
}
