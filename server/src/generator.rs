//! Puzzle generation: fill a complete grid with randomized backtracking,
//! then carve cells while the solution stays unique.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::solver;
use shared::{Board, BOARD_SIZE, EMPTY_CELL, MAX_VALUE, MIN_VALUE};

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;
pub const MIN_REMOVED_CELLS: usize = 20;
pub const MAX_REMOVED_CELLS: usize = 60;

/// Generates a puzzle with a single solution. Difficulty is clamped to
/// 1..=10 and controls how many cells are carved out. All randomness comes
/// from `rng`, so a seeded generator reproduces the same puzzle.
pub fn generate_puzzle<R: Rng>(difficulty: u8, rng: &mut R) -> Board {
    let mut board = filled_board(rng);
    carve_unique(&mut board, removal_target(difficulty), rng);
    board
}

/// Builds a complete valid grid by filling cells in row-major order, trying
/// the candidate values in a shuffled order at each cell.
pub fn filled_board<R: Rng>(rng: &mut R) -> Board {
    let mut board = Board::new();
    let filled = fill_from(&mut board, 0, rng);
    debug_assert!(filled, "an empty grid always completes");
    board
}

/// Maps difficulty to the number of cells to carve: 20 + 4 per level.
pub fn removal_target(difficulty: u8) -> usize {
    let level = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY) as usize;
    MIN_REMOVED_CELLS + (MAX_REMOVED_CELLS - MIN_REMOVED_CELLS) * level / 10
}

/// Carves up to `removals` cells out of a full grid, visiting the 81
/// positions in a shuffled order. Each clear is kept only if the puzzle
/// still has exactly one solution, otherwise the value is restored.
/// Returns the number of cells actually removed, which can fall short of
/// the target when every remaining candidate would break uniqueness.
pub fn carve_unique<R: Rng>(board: &mut Board, removals: usize, rng: &mut R) -> usize {
    let mut positions: Vec<(usize, usize)> = (0..BOARD_SIZE)
        .flat_map(|row| (0..BOARD_SIZE).map(move |col| (row, col)))
        .collect();
    positions.shuffle(rng);

    let mut removed = 0;
    for (row, col) in positions {
        if removed == removals {
            break;
        }
        let value = board.cells()[row][col];
        if value == EMPTY_CELL {
            continue;
        }
        board.set(row, col, EMPTY_CELL);
        if solver::has_unique_solution(board) {
            removed += 1;
        } else {
            board.set(row, col, value);
        }
    }
    removed
}

fn fill_from<R: Rng>(board: &mut Board, index: usize, rng: &mut R) -> bool {
    if index == BOARD_SIZE * BOARD_SIZE {
        return true;
    }
    let row = index / BOARD_SIZE;
    let col = index % BOARD_SIZE;

    let mut candidates: Vec<u8> = (MIN_VALUE..=MAX_VALUE).collect();
    candidates.shuffle(rng);
    for value in candidates {
        if solver::fits(board, row, col, value) {
            board.set(row, col, value);
            if fill_from(board, index + 1, rng) {
                return true;
            }
            board.set(row, col, EMPTY_CELL);
        }
    }
    false
}
