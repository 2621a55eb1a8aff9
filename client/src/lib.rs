//! # Sudoku Lobby Client Library
//!
//! This library provides the client-side implementation for shared Sudoku
//! sessions. It handles the WebSocket connection to the lobby server, tracks
//! the board state broadcast by the server, and exposes the pieces the
//! interactive terminal binary is built from.
//!
//! ## Architecture Overview
//!
//! ### Server Authority
//! The client never decides whether a move is legal. Every move and clear is
//! sent to the server, and the local board only changes when a state
//! broadcast comes back. A rejected request produces an error message for
//! this client alone and leaves the board as it was.
//!
//! ### Shared Sessions
//! Several clients can join the same lobby token. Whenever any of them
//! changes the board, the server broadcasts the new state to everyone, so
//! the local mirror also advances on moves made by other participants.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The local session mirror: the live board, the protected initial board,
//! and completion tracking fed from server state broadcasts.
//!
//! ### Network Module (`network`)
//! The WebSocket connection: joining a lobby by token, sending move, clear
//! and state requests, and reading parsed server messages.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::SessionState;
//! use client::network::LobbyClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = LobbyClient::connect("127.0.0.1:8080", "LOBBY_TOKEN").await?;
//!     let mut session = SessionState::new();
//!
//!     client.request_state().await?;
//!     if let Some(message) = client.next_message().await {
//!         session.apply(&message);
//!         println!("{}", session.board);
//!     }
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod network;
