//! Move judging: advances a player's attempt against the configured
//! solution lines of the active puzzle.
//!
//! Several lines can stay viable at once while they share a prefix; the
//! engine prunes a line the moment its expected token diverges from what
//! was actually played. The simulated opponent reply always comes from the
//! highest-priority (first-listed) line still viable.

use shakmaty::Chess;

use crate::board::{self, OracleError};
use crate::line::PuzzleConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptStatus {
    NotYetAttempted,
    InProgress,
    Succeeded { line_id: u32 },
    Failed,
}

/// One player's judgment state for the active puzzle. Reset at every
/// launch; mutated only by [`judge_move`].
#[derive(Debug, Clone)]
pub struct Attempt {
    pub status: AttemptStatus,
    /// Progress index into the solution-line tokens. Advances only forward.
    pub step: usize,
    /// Position reached so far.
    pub position: Chess,
    /// Ids of the solution lines still viable for this attempt.
    pub viable: Vec<u32>,
}

impl Attempt {
    pub fn new(puzzle: &PuzzleConfig) -> Result<Self, OracleError> {
        Ok(Self {
            status: AttemptStatus::NotYetAttempted,
            step: 0,
            position: board::parse_fen(&puzzle.position)?,
            viable: puzzle.lines.iter().map(|l| l.id).collect(),
        })
    }

    /// Succeeded or failed: no further submissions are judged.
    pub fn concluded(&self) -> bool {
        matches!(
            self.status,
            AttemptStatus::Succeeded { .. } | AttemptStatus::Failed
        )
    }

    /// The token a still-viable line expects next, for admin telemetry.
    pub fn expected_token<'a>(&self, puzzle: &'a PuzzleConfig) -> Option<&'a str> {
        self.viable
            .iter()
            .find_map(|id| puzzle.line(*id))
            .and_then(|l| l.moves.get(self.step))
            .map(String::as_str)
    }
}

/// The simulated opponent's move, applied server-side after a correct
/// player move.
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentReply {
    pub san: String,
    pub position_after: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Correct move, line not finished: the opponent has replied and
    /// another player move is expected.
    Progress { played: String, reply: OpponentReply },

    /// Correct move completing a solution line.
    Solved {
        played: String,
        line_id: u32,
        /// Present when the line ended on the opponent's reply.
        reply: Option<OpponentReply>,
        final_position: String,
    },

    /// Illegal move, or a legal move matching no viable line.
    Incorrect { attempted: String },

    /// The configured opponent reply is illegal from the reached position —
    /// a broken puzzle definition, not a player mistake.
    BrokenLine { line_id: u32, reply_token: String },
}

fn token_eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Judge one submitted move. The caller guarantees the puzzle is active and
/// the attempt is not yet concluded.
pub fn judge_move(attempt: &mut Attempt, puzzle: &PuzzleConfig, raw: &str) -> Verdict {
    let submitted = crate::line::normalize_move(raw);

    // An illegal move can never match any solution line.
    let (after_player, played) = match board::apply_san(&attempt.position, submitted) {
        Ok(result) => result,
        Err(_) => {
            attempt.status = AttemptStatus::Failed;
            return Verdict::Incorrect {
                attempted: submitted.to_string(),
            };
        }
    };

    // Keep every line whose expected token matches the canonical SAN.
    let matched: Vec<u32> = puzzle
        .lines
        .iter()
        .filter(|l| attempt.viable.contains(&l.id))
        .filter(|l| l.moves.get(attempt.step).is_some_and(|t| token_eq(t, &played)))
        .map(|l| l.id)
        .collect();

    if matched.is_empty() {
        attempt.status = AttemptStatus::Failed;
        return Verdict::Incorrect {
            attempted: submitted.to_string(),
        };
    }

    attempt.position = after_player;
    attempt.step += 1;
    attempt.viable = matched;

    // A line may end on the player's own move (odd token count).
    if let Some(done) = finished_line(attempt, puzzle) {
        attempt.status = AttemptStatus::Succeeded { line_id: done };
        return Verdict::Solved {
            played,
            line_id: done,
            reply: None,
            final_position: board::to_fen(&attempt.position),
        };
    }

    // Opponent reply from the highest-priority viable line. Authored by the
    // admin, so expected to be legal; if not, the puzzle definition is
    // broken and the attempt cannot continue.
    let primary_id = attempt.viable[0];
    let reply_token = puzzle
        .line(primary_id)
        .and_then(|l| l.moves.get(attempt.step))
        .cloned()
        .unwrap_or_default();

    let (after_reply, reply_san) = match board::apply_san(&attempt.position, &reply_token) {
        Ok(result) => result,
        Err(_) => {
            attempt.status = AttemptStatus::Failed;
            return Verdict::BrokenLine {
                line_id: primary_id,
                reply_token,
            };
        }
    };

    attempt.position = after_reply;
    attempt.step += 1;

    // Lines that configured a different reply drop out of viability.
    let reply_step = attempt.step - 1;
    attempt.viable = puzzle
        .lines
        .iter()
        .filter(|l| attempt.viable.contains(&l.id))
        .filter(|l| {
            l.id == primary_id
                || l.moves.get(reply_step).is_some_and(|t| token_eq(t, &reply_san))
        })
        .map(|l| l.id)
        .collect();

    let reply = OpponentReply {
        san: reply_san,
        position_after: board::to_fen(&attempt.position),
    };

    if let Some(done) = finished_line(attempt, puzzle) {
        attempt.status = AttemptStatus::Succeeded { line_id: done };
        return Verdict::Solved {
            played,
            line_id: done,
            final_position: reply.position_after.clone(),
            reply: Some(reply),
        };
    }

    attempt.status = AttemptStatus::InProgress;
    Verdict::Progress { played, reply }
}

/// Highest-priority viable line exhausted at the current step, if any.
fn finished_line(attempt: &Attempt, puzzle: &PuzzleConfig) -> Option<u32> {
    puzzle
        .lines
        .iter()
        .filter(|l| attempt.viable.contains(&l.id))
        .find(|l| l.moves.len() == attempt.step)
        .map(|l| l.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STANDARD_START_FEN;
    use crate::line::SolutionLine;

    fn line(id: u32, moves: &[&str], points: f64) -> SolutionLine {
        SolutionLine {
            id,
            label: format!("Line {}", id + 1),
            moves: moves.iter().map(|m| m.to_string()).collect(),
            points,
        }
    }

    fn puzzle(lines: Vec<SolutionLine>) -> PuzzleConfig {
        PuzzleConfig {
            position: STANDARD_START_FEN.to_string(),
            lines,
            timer_secs: 60,
        }
    }

    #[test]
    fn correct_move_completes_single_line() {
        // Player move + configured opponent reply exhausts the line
        let puzzle = puzzle(vec![line(0, &["e4", "e5"], 100.0)]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        match judge_move(&mut attempt, &puzzle, "e4") {
            Verdict::Solved {
                played,
                line_id,
                reply: Some(reply),
                ..
            } => {
                assert_eq!(played, "e4");
                assert_eq!(line_id, 0);
                assert_eq!(reply.san, "e5");
            }
            other => panic!("expected solved, got {other:?}"),
        }
        assert_eq!(attempt.status, AttemptStatus::Succeeded { line_id: 0 });
        assert_eq!(attempt.step, 2);
    }

    #[test]
    fn legal_but_wrong_move_fails() {
        let puzzle = puzzle(vec![line(0, &["e4", "e5"], 100.0)]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        match judge_move(&mut attempt, &puzzle, "d4") {
            Verdict::Incorrect { attempted } => assert_eq!(attempted, "d4"),
            other => panic!("expected incorrect, got {other:?}"),
        }
        assert_eq!(attempt.status, AttemptStatus::Failed);
        // No opponent reply, no progress
        assert_eq!(attempt.step, 0);
    }

    #[test]
    fn illegal_move_fails_without_line_comparison() {
        let puzzle = puzzle(vec![line(0, &["e4", "e5"], 100.0)]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        assert!(matches!(
            judge_move(&mut attempt, &puzzle, "Qh5"),
            Verdict::Incorrect { .. }
        ));
        assert_eq!(attempt.status, AttemptStatus::Failed);
    }

    #[test]
    fn shared_prefix_keeps_both_lines_viable() {
        // Two lines share "Nf3", diverge on the reply
        let puzzle = puzzle(vec![
            line(0, &["Nf3", "Nc6", "e4"], 100.0),
            line(1, &["Nf3", "Nc6", "d4"], 80.0),
        ]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        match judge_move(&mut attempt, &puzzle, "Nf3") {
            Verdict::Progress { reply, .. } => assert_eq!(reply.san, "Nc6"),
            other => panic!("expected progress, got {other:?}"),
        }
        assert_eq!(attempt.viable, vec![0, 1]);
        assert_eq!(attempt.status, AttemptStatus::InProgress);

        // Second player move commits to the alternate line
        match judge_move(&mut attempt, &puzzle, "d4") {
            Verdict::Solved { line_id, .. } => assert_eq!(line_id, 1),
            other => panic!("expected solved, got {other:?}"),
        }
    }

    #[test]
    fn diverging_reply_prunes_to_primary_line() {
        // Same opening move, different configured replies: the primary
        // line's reply is played and the other line drops out.
        let puzzle = puzzle(vec![
            line(0, &["Nf3", "Nc6", "e4"], 100.0),
            line(1, &["Nf3", "d5", "c4"], 80.0),
        ]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        match judge_move(&mut attempt, &puzzle, "Nf3") {
            Verdict::Progress { reply, .. } => assert_eq!(reply.san, "Nc6"),
            other => panic!("expected progress, got {other:?}"),
        }
        assert_eq!(attempt.viable, vec![0]);
    }

    #[test]
    fn odd_length_line_ends_on_player_move() {
        let puzzle = puzzle(vec![line(0, &["e4", "e5", "Nf3"], 50.0)]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        assert!(matches!(
            judge_move(&mut attempt, &puzzle, "e4"),
            Verdict::Progress { .. }
        ));
        match judge_move(&mut attempt, &puzzle, "Nf3") {
            Verdict::Solved { reply: None, line_id, .. } => assert_eq!(line_id, 0),
            other => panic!("expected solved without reply, got {other:?}"),
        }
    }

    #[test]
    fn comparison_is_case_insensitive() {
        // Expected token in odd casing still matches the canonical SAN
        let puzzle = puzzle(vec![line(0, &["NF3", "Nc6"], 10.0)]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        match judge_move(&mut attempt, &puzzle, "Nf3") {
            Verdict::Solved { reply: Some(reply), .. } => assert_eq!(reply.san, "Nc6"),
            other => panic!("expected solved, got {other:?}"),
        }
    }

    #[test]
    fn illegal_configured_reply_is_a_broken_line() {
        // Opponent "reply" e5 is illegal after 1. e4 e5 was never played —
        // here Ke7 is flatly illegal from the position after e4.
        let puzzle = puzzle(vec![line(0, &["e4", "Ke7", "Nf3"], 10.0)]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        match judge_move(&mut attempt, &puzzle, "e4") {
            Verdict::BrokenLine { line_id, reply_token } => {
                assert_eq!(line_id, 0);
                assert_eq!(reply_token, "Ke7");
            }
            other => panic!("expected broken line, got {other:?}"),
        }
        // Attempt is failed so the player is not blocked forever
        assert_eq!(attempt.status, AttemptStatus::Failed);
    }

    #[test]
    fn progress_never_regresses() {
        let puzzle = puzzle(vec![line(0, &["e4", "e5", "Nf3", "Nc6", "Bb5"], 10.0)]);
        let mut attempt = Attempt::new(&puzzle).unwrap();

        judge_move(&mut attempt, &puzzle, "e4");
        let after_first = attempt.step;
        judge_move(&mut attempt, &puzzle, "Nf3");
        assert!(attempt.step > after_first);
    }

    #[test]
    fn expected_token_tracks_progress() {
        let puzzle = puzzle(vec![line(0, &["e4", "e5", "Nf3", "Nc6"], 10.0)]);
        let mut attempt = Attempt::new(&puzzle).unwrap();
        assert_eq!(attempt.expected_token(&puzzle), Some("e4"));
        judge_move(&mut attempt, &puzzle, "e4");
        assert_eq!(attempt.expected_token(&puzzle), Some("Nf3"));
    }
}
