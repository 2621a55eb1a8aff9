//! Lobby registry and per-lobby session state: membership, move dispatch
//! and broadcasting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, error, info};
use rand::thread_rng;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::lobby::{Lobby, LobbyError};
use shared::ServerMessage;

/// Handle for queueing outbound JSON to one client. The receiving end is
/// owned by that client's socket writer task.
pub type OutboundTx = mpsc::UnboundedSender<String>;

/// Registry of all live lobbies, keyed by join token. Lobbies are never
/// evicted; the registry grows for the lifetime of the process.
pub struct Hub {
    lobbies: RwLock<HashMap<String, Arc<LobbySession>>>,
    next_client_id: AtomicU32,
    difficulty: u8,
}

impl Hub {
    pub fn new(difficulty: u8) -> Self {
        Self {
            lobbies: RwLock::new(HashMap::new()),
            next_client_id: AtomicU32::new(1),
            difficulty,
        }
    }

    /// Creates a lobby at the hub's configured difficulty and registers it
    /// under its token. Tokens are 192 bits of randomness, so collisions
    /// are not checked for.
    pub async fn create_lobby(&self) -> Result<String, LobbyError> {
        let lobby = Lobby::create(self.difficulty, &mut thread_rng())?;
        let token = lobby.id.clone();
        let session = Arc::new(LobbySession::new(lobby));
        let total = {
            let mut lobbies = self.lobbies.write().await;
            lobbies.insert(token.clone(), session);
            lobbies.len()
        };
        info!("Created lobby {} ({} total)", token, total);
        Ok(token)
    }

    pub async fn lobby(&self, token: &str) -> Option<Arc<LobbySession>> {
        self.lobbies.read().await.get(token).cloned()
    }

    pub async fn lobby_count(&self) -> usize {
        self.lobbies.read().await.len()
    }

    /// Client ids are unique across all lobbies, which keeps log lines
    /// unambiguous.
    pub fn next_client_id(&self) -> u32 {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// One lobby's runtime state. The board lives behind a Mutex so each
/// validate-apply-broadcast step runs as a unit; membership sits behind its
/// own lock so joins and leaves never wait on moves. Lock order is always
/// board first, then clients.
pub struct LobbySession {
    lobby: Mutex<Lobby>,
    clients: RwLock<HashMap<u32, OutboundTx>>,
}

impl LobbySession {
    fn new(lobby: Lobby) -> Self {
        Self {
            lobby: Mutex::new(lobby),
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub async fn join(&self, client_id: u32, tx: OutboundTx) {
        self.clients.write().await.insert(client_id, tx);
    }

    /// Removes a client and returns how many remain.
    pub async fn leave(&self, client_id: u32) -> usize {
        let mut clients = self.clients.write().await;
        clients.remove(&client_id);
        clients.len()
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Validates and applies one move. On failure the error goes to the
    /// sender only; on success everyone receives the move confirmation
    /// followed by a state snapshot. The board lock is held across the
    /// whole step so concurrent moves serialize and their success/state
    /// pairs never interleave.
    pub async fn handle_move(&self, row: usize, col: usize, value: u8, reply: &OutboundTx) {
        let mut lobby = self.lobby.lock().await;
        match lobby.puzzle.make_move(row, col, value) {
            Err(err) => {
                debug!(
                    "Rejected move row={}, col={}, value={} in lobby {}: {}",
                    row, col, value, lobby.id, err
                );
                send_message(reply, &ServerMessage::error(row, col, value, err.to_string()));
            }
            Ok(()) => {
                info!(
                    "Successful move: row={}, col={}, value={} in lobby {}",
                    row, col, value, lobby.id
                );
                if lobby.puzzle.is_complete() {
                    info!("Lobby {} board is complete", lobby.id);
                }
                let success = ServerMessage::success(row, col, value);
                let state = ServerMessage::state(lobby.puzzle.clone(), lobby.initial.clone());
                self.broadcast(&success).await;
                self.broadcast(&state).await;
            }
        }
    }

    /// Clears a player-filled cell. Cells given by the initial puzzle are
    /// protected. Same fan-out rules as `handle_move`; the confirmation
    /// echoes value 0.
    pub async fn handle_clear(&self, row: usize, col: usize, reply: &OutboundTx) {
        let mut guard = self.lobby.lock().await;
        let lobby = &mut *guard;
        match lobby.puzzle.clear_cell_guarded(row, col, &lobby.initial) {
            Err(err) => {
                debug!(
                    "Rejected clear row={}, col={} in lobby {}: {}",
                    row, col, lobby.id, err
                );
                send_message(reply, &ServerMessage::error(row, col, 0, err.to_string()));
            }
            Ok(()) => {
                info!(
                    "Successful clear: row={}, col={} in lobby {}",
                    row, col, lobby.id
                );
                let success = ServerMessage::success(row, col, 0);
                let state = ServerMessage::state(lobby.puzzle.clone(), lobby.initial.clone());
                self.broadcast(&success).await;
                self.broadcast(&state).await;
            }
        }
    }

    /// Sends a state snapshot to the requesting client only.
    pub async fn handle_request_state(&self, reply: &OutboundTx) {
        let state = {
            let lobby = self.lobby.lock().await;
            ServerMessage::state(lobby.puzzle.clone(), lobby.initial.clone())
        };
        send_message(reply, &state);
    }

    /// Serializes once, then fans out. The member list is copied under the
    /// read lock and the sends happen after it is released; a send to a
    /// client whose writer task already exited is dropped silently, the
    /// membership entry goes away on that connection's exit path.
    pub async fn broadcast(&self, message: &ServerMessage) {
        let Some(json) = encode(message) else { return };
        let recipients: Vec<(u32, OutboundTx)> = {
            let clients = self.clients.read().await;
            clients.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };
        debug!("Broadcasting to {} clients", recipients.len());
        for (client_id, tx) in recipients {
            if tx.send(json.clone()).is_err() {
                debug!("Client {} outbound channel closed, dropping message", client_id);
            }
        }
    }
}

/// Queues one message for one client. Failures mean the client's writer
/// task is gone; the disconnect path cleans up membership.
pub fn send_message(tx: &OutboundTx, message: &ServerMessage) {
    let Some(json) = encode(message) else { return };
    let _ = tx.send(json);
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(err) => {
            error!("Failed to encode outbound message: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Board, MoveError};

    fn test_lobby() -> Lobby {
        let puzzle = Board::from_cells([
            [5, 3, 0, 0, 7, 0, 0, 0, 0],
            [6, 0, 0, 1, 9, 5, 0, 0, 0],
            [0, 9, 8, 0, 0, 0, 0, 6, 0],
            [8, 0, 0, 0, 6, 0, 0, 0, 3],
            [4, 0, 0, 8, 0, 3, 0, 0, 1],
            [7, 0, 0, 0, 2, 0, 0, 0, 6],
            [0, 6, 0, 0, 0, 0, 2, 8, 0],
            [0, 0, 0, 4, 1, 9, 0, 0, 5],
            [0, 0, 0, 0, 8, 0, 0, 7, 9],
        ]);
        Lobby {
            id: "test-lobby-token".to_string(),
            initial: puzzle.clone(),
            solution: puzzle.clone(),
            puzzle,
        }
    }

    fn session() -> LobbySession {
        LobbySession::new(test_lobby())
    }

    fn parse(json: &str) -> ServerMessage {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_create_lobby_registers_token() {
        let hub = Hub::new(1);
        let token = hub.create_lobby().await.unwrap();
        assert_eq!(token.len(), shared::TOKEN_LENGTH);
        assert!(hub.lobby(&token).await.is_some());
        assert_eq!(hub.lobby_count().await, 1);
        assert!(hub.lobby("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_client_ids_are_unique() {
        let hub = Hub::new(1);
        let first = hub.next_client_id();
        let second = hub.next_client_id();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_join_and_leave_track_membership() {
        let session = session();
        let (tx, _rx) = mpsc::unbounded_channel();
        session.join(1, tx.clone()).await;
        session.join(2, tx).await;
        assert_eq!(session.client_count().await, 2);
        assert_eq!(session.leave(1).await, 1);
        assert_eq!(session.leave(1).await, 1);
        assert_eq!(session.leave(2).await, 0);
    }

    #[tokio::test]
    async fn test_valid_move_broadcasts_success_then_state() {
        let session = session();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        session.join(1, tx1.clone()).await;
        session.join(2, tx2).await;

        session.handle_move(0, 2, 4, &tx1).await;

        for rx in [&mut rx1, &mut rx2] {
            let success = parse(&rx.recv().await.unwrap());
            assert_eq!(success, ServerMessage::success(0, 2, 4));
            match parse(&rx.recv().await.unwrap()) {
                ServerMessage::State {
                    board,
                    initial_board,
                } => {
                    assert_eq!(board.value(0, 2), Ok(4));
                    assert_eq!(initial_board.value(0, 2), Ok(0));
                }
                other => panic!("expected state message, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_move_errors_to_sender_only() {
        let session = session();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        session.join(1, tx1.clone()).await;
        session.join(2, tx2).await;

        // 5 already sits in row 0.
        session.handle_move(0, 2, 5, &tx1).await;

        match parse(&rx1.recv().await.unwrap()) {
            ServerMessage::Error {
                row,
                col,
                value,
                success,
                error,
            } => {
                assert_eq!((row, col, value), (0, 2, 5));
                assert!(!success);
                assert_eq!(error, MoveError::RowConflict.to_string());
            }
            other => panic!("expected error message, got {:?}", other),
        }
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_second_move_on_same_cell_is_rejected() {
        let session = session();
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.join(1, tx.clone()).await;

        session.handle_move(0, 2, 4, &tx).await;
        session.handle_move(0, 2, 4, &tx).await;

        let _success = rx.recv().await.unwrap();
        let _state = rx.recv().await.unwrap();
        match parse(&rx.recv().await.unwrap()) {
            ServerMessage::Error { error, .. } => {
                assert_eq!(error, MoveError::CellOccupied.to_string());
            }
            other => panic!("expected error message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clear_protects_initial_cells() {
        let session = session();
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.join(1, tx.clone()).await;

        session.handle_clear(0, 0, &tx).await;

        match parse(&rx.recv().await.unwrap()) {
            ServerMessage::Error {
                row, col, value, error, ..
            } => {
                assert_eq!((row, col, value), (0, 0, 0));
                assert_eq!(error, MoveError::ProtectedCell.to_string());
            }
            other => panic!("expected error message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clear_confirms_with_value_zero() {
        let session = session();
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.join(1, tx.clone()).await;

        session.handle_move(0, 2, 4, &tx).await;
        let _success = rx.recv().await.unwrap();
        let _state = rx.recv().await.unwrap();

        session.handle_clear(0, 2, &tx).await;
        let success = parse(&rx.recv().await.unwrap());
        assert_eq!(success, ServerMessage::success(0, 2, 0));
        match parse(&rx.recv().await.unwrap()) {
            ServerMessage::State { board, .. } => {
                assert_eq!(board.value(0, 2), Ok(0));
            }
            other => panic!("expected state message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_state_answers_requester_only() {
        let session = session();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        session.join(1, tx1.clone()).await;
        session.join(2, tx2).await;

        session.handle_request_state(&tx1).await;

        match parse(&rx1.recv().await.unwrap()) {
            ServerMessage::State {
                board,
                initial_board,
            } => {
                assert_eq!(board, initial_board);
            }
            other => panic!("expected state message, got {:?}", other),
        }
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_survives_closed_channels() {
        let session = session();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        session.join(1, tx1).await;
        session.join(2, tx2).await;
        drop(rx1);

        session.broadcast(&ServerMessage::success(0, 2, 4)).await;
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_moves_serialize_per_lobby() {
        let session = Arc::new(session());
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.join(1, tx.clone()).await;

        // Same empty cell, nine candidate values: exactly one writer wins,
        // the rest fail on occupancy or a constraint.
        let mut handles = Vec::new();
        for value in 1..=9u8 {
            let session = Arc::clone(&session);
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                session.handle_move(4, 4, value, &tx).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // Release every sender clone so the drain loop terminates.
        session.leave(1).await;
        drop(tx);

        let mut successes = 0;
        let mut errors = 0;
        while let Some(json) = rx.recv().await {
            match parse(&json) {
                ServerMessage::Success { .. } => successes += 1,
                ServerMessage::Error { .. } => errors += 1,
                ServerMessage::State { .. } => {}
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(errors, 8);
    }
}
