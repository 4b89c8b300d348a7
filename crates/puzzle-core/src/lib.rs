//! Domain logic for live tactics sessions: board oracle, solution-line
//! handling, move judging and scoring. No transport or async code here —
//! everything is driven by the server crate.

pub mod board;
pub mod judge;
pub mod line;
pub mod score;

pub use board::OracleError;
pub use judge::{Attempt, AttemptStatus, OpponentReply, Verdict};
pub use line::{PuzzleConfig, PuzzleError, SolutionLine};
