//! Solution lines and the move-line normalizer.
//!
//! Administrators enter lines as free text ("1. e4 e5, 2. Nf3"); the
//! normalizer strips numbering and punctuation noise down to bare move
//! tokens. Tokens alternate player move / opponent reply, starting with a
//! player move.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::board;

/// Upper bound on solution lines per puzzle.
pub const MAX_SOLUTION_LINES: usize = 3;

/// Enforced floor for the puzzle timer.
pub const MIN_TIMER_SECS: u32 = 10;

/// One accepted solving path: an alternating move sequence with its own
/// point value. The first-listed line of a puzzle is the primary one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionLine {
    /// Unique within the owning puzzle.
    pub id: u32,
    pub label: String,
    pub moves: Vec<String>,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleConfig {
    /// FEN of the starting position.
    pub position: String,
    pub lines: Vec<SolutionLine>,
    pub timer_secs: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("position is not a valid FEN string")]
    BadPosition,

    #[error("puzzle needs at least one solution line")]
    NoLines,

    #[error("puzzle has too many solution lines (max {MAX_SOLUTION_LINES})")]
    TooManyLines,

    #[error("solution line \"{0}\" has no moves")]
    EmptyLine(String),

    #[error("solution line \"{0}\" must be worth positive points")]
    NonPositivePoints(String),
}

/// Split a raw admin-entered line string into move tokens.
///
/// Strips move-number prefixes ("1.", "12...") and commas, collapses
/// whitespace. Idempotent: normalizing already-normalized tokens joined by
/// single spaces yields the same sequence. Empty input yields an empty
/// sequence; launch validation rejects that.
pub fn normalize_line(raw: &str) -> Vec<String> {
    let number_re = Regex::new(r"\d+\.+\s*").unwrap();
    let stripped = number_re.replace_all(raw, "");
    stripped
        .replace(',', " ")
        .split_whitespace()
        .map(|tok| tok.to_string())
        .collect()
}

/// Single-move normalization for live player input: trim only. Players type
/// a bare SAN move, not a pre-formatted line.
pub fn normalize_move(raw: &str) -> &str {
    raw.trim()
}

impl PuzzleConfig {
    /// Full validation, required before launch.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        board::parse_fen(&self.position).map_err(|_| PuzzleError::BadPosition)?;
        if self.lines.is_empty() {
            return Err(PuzzleError::NoLines);
        }
        if self.lines.len() > MAX_SOLUTION_LINES {
            return Err(PuzzleError::TooManyLines);
        }
        for line in &self.lines {
            if line.moves.is_empty() {
                return Err(PuzzleError::EmptyLine(line.label.clone()));
            }
            if line.points <= 0.0 {
                return Err(PuzzleError::NonPositivePoints(line.label.clone()));
            }
        }
        Ok(())
    }

    /// The point ceiling advertised to clients at launch: the best base
    /// value among the configured lines.
    pub fn max_points(&self) -> f64 {
        self.lines.iter().map(|l| l.points).fold(0.0, f64::max)
    }

    pub fn line(&self, id: u32) -> Option<&SolutionLine> {
        self.lines.iter().find(|l| l.id == id)
    }
}
