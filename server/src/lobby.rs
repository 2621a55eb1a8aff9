//! Lobby creation: an opaque join token plus the puzzle, its initial
//! givens, and the solved grid.

use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use thiserror::Error;

use crate::{generator, solver};
use shared::{Board, TOKEN_LENGTH};

pub const DEFAULT_DIFFICULTY: u8 = 5;

/// URL-safe base64 alphabet. 256 is a multiple of 64, so reducing a random
/// byte modulo the alphabet size keeps the distribution uniform.
const TOKEN_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("failed to generate lobby token: {0}")]
    TokenGeneration(#[from] rand::Error),
    #[error("failed to solve the puzzle")]
    Unsolvable,
}

/// One lobby's board state. `puzzle` is the live grid that moves mutate,
/// `initial` is the immutable givens snapshot, `solution` the full solved
/// grid produced at creation time.
#[derive(Debug, Clone)]
pub struct Lobby {
    pub id: String,
    pub puzzle: Board,
    pub initial: Board,
    pub solution: Board,
}

impl Lobby {
    /// Generates a fresh lobby: token, carved puzzle, givens snapshot and
    /// solution. `rng` drives the puzzle so tests can seed it; the token
    /// always comes from the operating system's random source.
    pub fn create<R: Rng>(difficulty: u8, rng: &mut R) -> Result<Self, LobbyError> {
        let id = generate_token()?;
        let puzzle = generator::generate_puzzle(difficulty, rng);
        let initial = puzzle.clone();
        let solution = solver::solve(&puzzle).ok_or(LobbyError::Unsolvable)?;
        Ok(Self {
            id,
            puzzle,
            initial,
            solution,
        })
    }
}

/// Returns a 32-character URL-safe token from cryptographically random
/// bytes.
pub fn generate_token() -> Result<String, LobbyError> {
    let mut bytes = [0u8; TOKEN_LENGTH];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes
        .iter()
        .map(|&b| TOKEN_ALPHABET[b as usize % TOKEN_ALPHABET.len()] as char)
        .collect())
}
