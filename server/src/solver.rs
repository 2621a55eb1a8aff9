//! Backtracking solver used for puzzle validation during generation.

use shared::{Board, BOARD_SIZE, EMPTY_CELL, MAX_VALUE, MIN_VALUE};

/// Solves the board and returns the first completed grid found, or `None`
/// when no assignment of the empty cells satisfies the constraints. The
/// input board is never mutated.
pub fn solve(board: &Board) -> Option<Board> {
    let mut work = board.clone();
    if solve_first(&mut work) {
        Some(work)
    } else {
        None
    }
}

/// Counts solutions, stopping as soon as a second one is found. The result
/// is 0, 1, or 2, where 2 means "more than one". The input board is never
/// mutated.
pub fn count_solutions(board: &Board) -> usize {
    let mut work = board.clone();
    let mut count = 0;
    count_from(&mut work, &mut count);
    count
}

pub fn has_unique_solution(board: &Board) -> bool {
    count_solutions(board) == 1
}

/// True when placing `value` at the cell conflicts with no row, column or
/// box. Callers pass in-bounds coordinates of an empty cell.
pub(crate) fn fits(board: &Board, row: usize, col: usize, value: u8) -> bool {
    !board.row_contains(row, value)
        && !board.col_contains(col, value)
        && !board.box_contains(row, col, value)
}

fn first_empty(board: &Board) -> Option<(usize, usize)> {
    let cells = board.cells();
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            if cells[row][col] == EMPTY_CELL {
                return Some((row, col));
            }
        }
    }
    None
}

// Recursion depth is bounded by the number of empty cells, at most 81.
fn solve_first(board: &mut Board) -> bool {
    let Some((row, col)) = first_empty(board) else {
        return true;
    };
    for value in MIN_VALUE..=MAX_VALUE {
        if fits(board, row, col, value) {
            board.set(row, col, value);
            if solve_first(board) {
                return true;
            }
            board.set(row, col, EMPTY_CELL);
        }
    }
    false
}

fn count_from(board: &mut Board, count: &mut usize) {
    if *count > 1 {
        return;
    }
    let Some((row, col)) = first_empty(board) else {
        *count += 1;
        return;
    };
    for value in MIN_VALUE..=MAX_VALUE {
        if *count > 1 {
            return;
        }
        if fits(board, row, col, value) {
            board.set(row, col, value);
            count_from(board, count);
            board.set(row, col, EMPTY_CELL);
        }
    }
}
