use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const BOARD_SIZE: usize = 9;
pub const BOX_SIZE: usize = 3;
pub const EMPTY_CELL: u8 = 0;
pub const MIN_VALUE: u8 = 1;
pub const MAX_VALUE: u8 = 9;
pub const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("position out of bounds")]
    OutOfBounds,
    #[error("value must be between 1 and 9")]
    OutOfRange,
    #[error("cell is already filled")]
    CellOccupied,
    #[error("value already exists in this row")]
    RowConflict,
    #[error("value already exists in this column")]
    ColConflict,
    #[error("value already exists in this 3x3 box")]
    BoxConflict,
    #[error("cannot clear initial puzzle cells")]
    ProtectedCell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[u8; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[EMPTY_CELL; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn from_cells(cells: [[u8; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[[u8; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    pub fn value(&self, row: usize, col: usize) -> Result<u8, MoveError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(MoveError::OutOfBounds);
        }
        Ok(self.cells[row][col])
    }

    /// Writes a cell without constraint validation. Callers keep the
    /// coordinates in bounds; the generator and solver use this on boards
    /// they fully control.
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.cells[row][col] = value;
    }

    pub fn row_contains(&self, row: usize, value: u8) -> bool {
        self.cells[row].contains(&value)
    }

    pub fn col_contains(&self, col: usize, value: u8) -> bool {
        (0..BOARD_SIZE).any(|row| self.cells[row][col] == value)
    }

    pub fn box_contains(&self, row: usize, col: usize, value: u8) -> bool {
        let box_row = (row / BOX_SIZE) * BOX_SIZE;
        let box_col = (col / BOX_SIZE) * BOX_SIZE;
        (box_row..box_row + BOX_SIZE)
            .any(|r| (box_col..box_col + BOX_SIZE).any(|c| self.cells[r][c] == value))
    }

    /// Checks bounds, value range, target emptiness, then row, column and
    /// box conflicts, in that order. The first failing check wins.
    pub fn validate_move(&self, row: usize, col: usize, value: u8) -> Result<(), MoveError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(MoveError::OutOfBounds);
        }
        if !(MIN_VALUE..=MAX_VALUE).contains(&value) {
            return Err(MoveError::OutOfRange);
        }
        if self.cells[row][col] != EMPTY_CELL {
            return Err(MoveError::CellOccupied);
        }
        if self.row_contains(row, value) {
            return Err(MoveError::RowConflict);
        }
        if self.col_contains(col, value) {
            return Err(MoveError::ColConflict);
        }
        if self.box_contains(row, col, value) {
            return Err(MoveError::BoxConflict);
        }
        Ok(())
    }

    pub fn make_move(&mut self, row: usize, col: usize, value: u8) -> Result<(), MoveError> {
        self.validate_move(row, col, value)?;
        self.cells[row][col] = value;
        Ok(())
    }

    /// Clearing an already-empty cell succeeds; only out-of-bounds fails.
    pub fn clear_cell(&mut self, row: usize, col: usize) -> Result<(), MoveError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(MoveError::OutOfBounds);
        }
        self.cells[row][col] = EMPTY_CELL;
        Ok(())
    }

    /// Clears a cell unless it is a given in `initial`.
    pub fn clear_cell_guarded(
        &mut self,
        row: usize,
        col: usize,
        initial: &Board,
    ) -> Result<(), MoveError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(MoveError::OutOfBounds);
        }
        if initial.cells[row][col] != EMPTY_CELL {
            return Err(MoveError::ProtectedCell);
        }
        self.cells[row][col] = EMPTY_CELL;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let value = self.cells[row][col];
                if value == EMPTY_CELL {
                    continue;
                }
                // A cell never conflicts with itself, so count occurrences
                // instead of membership.
                let in_row = self.cells[row].iter().filter(|&&v| v == value).count();
                let in_col = (0..BOARD_SIZE)
                    .filter(|&r| self.cells[r][col] == value)
                    .count();
                let box_row = (row / BOX_SIZE) * BOX_SIZE;
                let box_col = (col / BOX_SIZE) * BOX_SIZE;
                let in_box = (box_row..box_row + BOX_SIZE)
                    .flat_map(|r| (box_col..box_col + BOX_SIZE).map(move |c| (r, c)))
                    .filter(|&(r, c)| self.cells[r][c] == value)
                    .count();
                if in_row > 1 || in_col > 1 || in_box > 1 {
                    return false;
                }
            }
        }
        true
    }

    pub fn is_complete(&self) -> bool {
        let filled = self
            .cells
            .iter()
            .all(|row| row.iter().all(|&v| v != EMPTY_CELL));
        filled && self.is_valid()
    }

    pub fn empty_positions(&self) -> Vec<(usize, usize)> {
        let mut positions = Vec::new();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if self.cells[row][col] == EMPTY_CELL {
                    positions.push((row, col));
                }
            }
        }
        positions
    }

    pub fn count_empty(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|&&v| v == EMPTY_CELL).count())
            .sum()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.cells.iter().enumerate() {
            if row > 0 && row % BOX_SIZE == 0 {
                writeln!(f, "------+-------+------")?;
            }
            for (col, &value) in cells.iter().enumerate() {
                if col > 0 && col % BOX_SIZE == 0 {
                    write!(f, "| ")?;
                }
                if value == EMPTY_CELL {
                    write!(f, ". ")?;
                } else {
                    write!(f, "{} ", value)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Move { row: usize, col: usize, value: u8 },
    Clear { row: usize, col: usize },
    RequestState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Success {
        row: usize,
        col: usize,
        value: u8,
        success: bool,
    },
    Error {
        row: usize,
        col: usize,
        value: u8,
        success: bool,
        error: String,
    },
    State {
        board: Board,
        #[serde(rename = "initialBoard")]
        initial_board: Board,
    },
}

impl ServerMessage {
    pub fn success(row: usize, col: usize, value: u8) -> Self {
        Self::Success {
            row,
            col,
            value,
            success: true,
        }
    }

    pub fn error(row: usize, col: usize, value: u8, error: impl Into<String>) -> Self {
        Self::Error {
            row,
            col,
            value,
            success: false,
            error: error.into(),
        }
    }

    /// Error shape for failures with no offending coordinates, e.g. a
    /// payload that never parsed. Coordinates echo as zeros on the wire.
    pub fn protocol_error(error: impl Into<String>) -> Self {
        Self::error(0, 0, 0, error)
    }

    pub fn state(board: Board, initial_board: Board) -> Self {
        Self::State {
            board,
            initial_board,
        }
    }
}
