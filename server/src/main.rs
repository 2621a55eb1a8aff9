//! Server binary: parses command line flags, builds the lobby hub and serves
//! the HTTP and WebSocket routes until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use log::info;

use server::hub::Hub;
use server::lobby::DEFAULT_DIFFICULTY;
use server::network;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Puzzle difficulty for new lobbies (1-10)
    #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let hub = Arc::new(Hub::new(args.difficulty));
    let routes = network::routes(Arc::clone(&hub));

    info!("Starting lobby server on {}", address);
    info!("Puzzle difficulty for new lobbies: {}", args.difficulty);

    tokio::select! {
        _ = warp::serve(routes).run(address) => {}
        _ = tokio::signal::ctrl_c() => {
            info!(
                "Received Ctrl+C, shutting down ({} lobbies live)",
                hub.lobby_count().await
            );
        }
    }

    Ok(())
}
