//! # Sudoku Lobby Server Library
//!
//! This library provides the authoritative server implementation for shared
//! Sudoku sessions. It owns every lobby's board state, validates all moves
//! against the game rules, and broadcasts the resulting state to every
//! connected client.
//!
//! ## Core Responsibilities
//!
//! ### Puzzle Generation
//! Each lobby starts from a freshly generated puzzle with exactly one
//! solution. Generation fills a complete board with randomized backtracking
//! and then removes cells one at a time, keeping only removals that preserve
//! uniqueness.
//!
//! ### Authoritative State
//! The server holds the definitive board for every lobby. Clients submit
//! moves and clears over WebSocket; the server checks each request against
//! the game rules and the protected initial cells, then either applies it or
//! answers the sender with a structured error. Clients never see a board
//! change without a confirming broadcast.
//!
//! ### Session Fan-Out
//! Accepted changes are broadcast to every client in the same lobby, so all
//! participants converge on the same board. Rejections stay private to the
//! sender.
//!
//! ## Module Organization
//!
//! ### Solver Module (`solver`)
//! Backtracking search over partial boards. Provides full solving plus a
//! capped solution counter used to enforce puzzle uniqueness.
//!
//! ### Generator Module (`generator`)
//! Produces playable puzzles from a difficulty level by carving cells out of
//! a complete board while the solver confirms a unique solution remains.
//!
//! ### Lobby Module (`lobby`)
//! A single session's state: the live board, the protected initial snapshot,
//! the precomputed solution, and the random token that names the lobby.
//!
//! ### Hub Module (`hub`)
//! The shared registry of live lobbies plus the per-lobby message handlers.
//! Each lobby serializes its own moves behind a mutex while separate lobbies
//! stay fully concurrent.
//!
//! ### Network Module (`network`)
//! The HTTP and WebSocket surface: lobby creation, join upgrades, health
//! checks, and the per-connection read and write loops.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use server::hub::Hub;
//! use server::network;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Difficulty 5 yields a mid-range number of empty cells per puzzle.
//!     let hub = Arc::new(Hub::new(5));
//!     let routes = network::routes(hub);
//!     warp::serve(routes).run(([127, 0, 0, 1], 8080)).await;
//! }
//! ```

pub mod generator;
pub mod hub;
pub mod lobby;
pub mod network;
pub mod solver;
