//! Chess rules oracle — a thin wrapper over shakmaty.
//!
//! Positions are immutable values: applying a move always produces a new
//! `Chess`, never mutates one threaded through callers.

use shakmaty::{
    fen::Fen,
    san::{San, SanPlus},
    CastlingMode, Chess, EnPassantMode, Position,
};

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("invalid position: {0}")]
    InvalidFen(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// Parse a FEN string into a position.
pub fn parse_fen(fen: &str) -> Result<Chess, OracleError> {
    let trimmed = fen.trim();
    let parsed: Fen = trimmed
        .parse()
        .map_err(|_| OracleError::InvalidFen(trimmed.to_string()))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|_| OracleError::InvalidFen(trimmed.to_string()))
}

/// Render a position back to FEN.
pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Attempt a SAN move against a position.
///
/// Returns the resulting position and the canonical SAN (with check/mate
/// suffix) of the move that was actually played. A move that does not parse
/// or is not legal from `pos` is an `IllegalMove`.
pub fn apply_san(pos: &Chess, text: &str) -> Result<(Chess, String), OracleError> {
    let trimmed = text.trim();
    let san: San = trimmed
        .parse()
        .map_err(|_| OracleError::IllegalMove(trimmed.to_string()))?;
    let mv = san
        .to_move(pos)
        .map_err(|_| OracleError::IllegalMove(trimmed.to_string()))?;
    let canonical = SanPlus::from_move(pos.clone(), mv).to_string();
    let mut next = pos.clone();
    next.play_unchecked(mv);
    Ok((next, canonical))
}

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
