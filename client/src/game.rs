use shared::{Board, ServerMessage, EMPTY_CELL};

/// Local mirror of the lobby board. The server stays authoritative: the
/// mirror only changes when a state broadcast arrives.
pub struct SessionState {
    pub board: Board,
    pub initial: Board,
    pub synced: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            initial: Board::new(),
            synced: false,
        }
    }

    pub fn apply(&mut self, message: &ServerMessage) {
        if let ServerMessage::State {
            board,
            initial_board,
        } = message
        {
            self.board = board.clone();
            self.initial = initial_board.clone();
            self.synced = true;
        }
    }

    pub fn is_given(&self, row: usize, col: usize) -> bool {
        self.initial
            .value(row, col)
            .map(|value| value != EMPTY_CELL)
            .unwrap_or(false)
    }

    pub fn is_solved(&self) -> bool {
        self.synced && self.board.is_complete()
    }

    pub fn remaining(&self) -> usize {
        self.board.count_empty()
    }
}
