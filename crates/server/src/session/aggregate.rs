//! The session aggregate: one administrator-run sequence of puzzles shared
//! by a group of players.
//!
//! Phases: Configuring → PuzzleActive → ResultsRevealed → (PuzzleActive …
//! | Concluded). Termination removes the session from the registry at any
//! point. All mutation happens through the methods here; the hub only
//! routes the returned outcomes to connections.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use puzzle_core::judge::{Attempt, AttemptStatus, Verdict};
use puzzle_core::line::{self, PuzzleConfig, SolutionLine, MAX_SOLUTION_LINES, MIN_TIMER_SECS};
use puzzle_core::{judge, score};

use super::ConnectionId;
use crate::error::CommandError;
use crate::protocol::{
    LeaderboardEntry, PlayerResult, PlayerSummary, PuzzleDraft, PuzzleView, SolutionLineView,
};

/// Upper bound on puzzle slots per session.
pub const MAX_PUZZLES: usize = 20;

/// Seed position for freshly created puzzle slots: bare kings, white to
/// move. Guaranteed to parse; never launchable (no solution lines yet).
const DEFAULT_POSITION: &str = "4k3/8/8/8/8/8/8/4K3 w - - 0 1";

const DEFAULT_TIMER_SECS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configuring,
    PuzzleActive,
    ResultsRevealed,
    Concluded,
}

/// One joined player. Cumulative score persists across puzzles; everything
/// else is per-puzzle attempt state.
#[derive(Debug, Clone)]
pub struct Player {
    pub conn: ConnectionId,
    pub nickname: String,
    pub score: f64,
    pub last_move: Option<String>,
    pub last_move_at: Option<DateTime<Utc>>,
    /// Stamped when the attempt concludes, success or failure.
    pub completed_at: Option<DateTime<Utc>>,
    pub attempt: Option<Attempt>,
}

impl Player {
    fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.conn,
            nickname: self.nickname.clone(),
            score: score::round2(self.score),
        }
    }
}

pub struct Session {
    pub id: String,
    /// The creating connection — sole authority for admin commands.
    pub admin_conn: ConnectionId,
    /// User identity behind the admin connection, for the activity log.
    pub admin_user: String,
    pub phase: Phase,
    pub puzzles: Vec<PuzzleConfig>,
    /// Most recently launched puzzle; `None` before the first launch.
    pub active_index: Option<usize>,
    pub launched_at: Option<DateTime<Utc>>,
    pub players: BTreeMap<ConnectionId, Player>,
    pub leaderboard: Vec<LeaderboardEntry>,
    bonus_multiplier: f64,
}

// ---- Command outcomes, routed by the hub ----

#[derive(Debug)]
pub struct JoinOutcome {
    pub player_id: ConnectionId,
    pub nickname: String,
    pub players: Vec<PlayerSummary>,
    pub puzzle_active: bool,
    pub current_puzzle: Option<PuzzleView>,
    pub end_time: Option<i64>,
}

#[derive(Debug)]
pub struct LaunchOutcome {
    pub puzzle_index: usize,
    pub puzzle: PuzzleView,
    pub end_time: i64,
}

#[derive(Debug)]
pub struct MoveOutcome {
    pub player_id: ConnectionId,
    pub nickname: String,
    pub submitted: String,
    pub at_ms: i64,
    pub kind: MoveOutcomeKind,
}

#[derive(Debug)]
pub enum MoveOutcomeKind {
    /// Correct step; the opponent replied and more moves are expected.
    Progress {
        new_position: String,
        opponent_move: String,
    },
    /// A solution line was completed.
    Completed {
        opponent_move: Option<String>,
        final_position: String,
        elapsed_ms: i64,
    },
    /// Wrong or illegal move; the attempt is failed.
    Failed { expected: Option<String> },
    /// Broken puzzle definition surfaced mid-attempt.
    BrokenPuzzle { line_label: String, reply_token: String },
}

#[derive(Debug)]
pub struct RevealOutcome {
    pub puzzle_index: usize,
    pub solution_lines: Vec<SolutionLineView>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub player_results: Vec<PlayerResult>,
}

#[derive(Debug)]
pub enum AdvanceOutcome {
    Next {
        next_puzzle_index: usize,
        total_puzzles: usize,
    },
    Concluded {
        leaderboard: Vec<LeaderboardEntry>,
    },
}

impl Session {
    pub fn new(
        id: String,
        admin_conn: ConnectionId,
        admin_user: String,
        num_puzzles: usize,
        bonus_multiplier: f64,
    ) -> Self {
        let puzzles = (0..num_puzzles)
            .map(|_| PuzzleConfig {
                position: DEFAULT_POSITION.to_string(),
                lines: Vec::new(),
                timer_secs: DEFAULT_TIMER_SECS,
            })
            .collect();
        Self {
            id,
            admin_conn,
            admin_user,
            phase: Phase::Configuring,
            puzzles,
            active_index: None,
            launched_at: None,
            players: BTreeMap::new(),
            leaderboard: Vec::new(),
            bonus_multiplier,
        }
    }

    pub fn authorize_admin(&self, caller: ConnectionId) -> Result<(), CommandError> {
        if caller == self.admin_conn {
            Ok(())
        } else {
            Err(CommandError::Unauthorized)
        }
    }

    pub fn players_summary(&self) -> Vec<PlayerSummary> {
        self.players.values().map(Player::summary).collect()
    }

    fn puzzle_view(&self, index: usize) -> PuzzleView {
        let puzzle = &self.puzzles[index];
        PuzzleView {
            position: puzzle.position.clone(),
            timer: puzzle.timer_secs,
            points: puzzle.max_points(),
        }
    }

    fn deadline_ms(&self) -> Option<i64> {
        let launched = self.launched_at?;
        let index = self.active_index?;
        Some(launched.timestamp_millis() + i64::from(self.puzzles[index].timer_secs) * 1000)
    }

    /// Replace a puzzle slot with an admin draft. The draft's raw line text
    /// is normalized into move tokens here; full validation happens at
    /// launch so partially-built drafts can be saved.
    pub fn update_puzzle(
        &mut self,
        caller: ConnectionId,
        index: usize,
        draft: PuzzleDraft,
    ) -> Result<(), CommandError> {
        self.authorize_admin(caller)?;
        if index >= self.puzzles.len() {
            return Err(CommandError::validation("Puzzle index out of range"));
        }
        if self.phase == Phase::PuzzleActive && self.active_index == Some(index) {
            return Err(CommandError::conflict(
                "The active puzzle cannot be edited until results are revealed",
            ));
        }
        if draft.solution_lines.len() > MAX_SOLUTION_LINES {
            return Err(CommandError::validation(format!(
                "A puzzle can have at most {MAX_SOLUTION_LINES} solution lines"
            )));
        }

        let lines = draft
            .solution_lines
            .iter()
            .enumerate()
            .map(|(i, l)| SolutionLine {
                id: i as u32,
                label: l
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("Line {}", i + 1)),
                moves: line::normalize_line(&l.moves),
                points: l.points,
            })
            .collect();

        self.puzzles[index] = PuzzleConfig {
            position: draft.position,
            lines,
            timer_secs: draft.timer.max(MIN_TIMER_SECS),
        };
        Ok(())
    }

    pub fn join(
        &mut self,
        conn: ConnectionId,
        nickname: &str,
    ) -> Result<JoinOutcome, CommandError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(CommandError::validation("Nickname cannot be empty"));
        }
        if nickname.len() > 32 {
            return Err(CommandError::validation(
                "Nickname must be 32 characters or fewer",
            ));
        }
        if self
            .players
            .values()
            .any(|p| p.nickname.eq_ignore_ascii_case(nickname))
        {
            return Err(CommandError::validation("Nickname is already taken"));
        }

        // A mid-puzzle joiner starts a fresh attempt on the live puzzle.
        let attempt = match (self.phase, self.active_index) {
            (Phase::PuzzleActive, Some(index)) => Some(
                Attempt::new(&self.puzzles[index])
                    .map_err(|e| CommandError::Internal(e.to_string()))?,
            ),
            _ => None,
        };

        self.players.insert(
            conn,
            Player {
                conn,
                nickname: nickname.to_string(),
                score: 0.0,
                last_move: None,
                last_move_at: None,
                completed_at: None,
                attempt,
            },
        );

        let puzzle_active = self.phase == Phase::PuzzleActive;
        Ok(JoinOutcome {
            player_id: conn,
            nickname: nickname.to_string(),
            players: self.players_summary(),
            puzzle_active,
            current_puzzle: self
                .active_index
                .filter(|_| puzzle_active)
                .map(|i| self.puzzle_view(i)),
            end_time: self.deadline_ms().filter(|_| puzzle_active),
        })
    }

    pub fn remove_player(&mut self, conn: ConnectionId) -> Option<Player> {
        self.players.remove(&conn)
    }

    pub fn launch(
        &mut self,
        caller: ConnectionId,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<LaunchOutcome, CommandError> {
        self.authorize_admin(caller)?;
        match self.phase {
            Phase::Configuring | Phase::ResultsRevealed => {}
            Phase::PuzzleActive => {
                return Err(CommandError::conflict(
                    "Another puzzle is still active — reveal its results first",
                ))
            }
            Phase::Concluded => {
                return Err(CommandError::conflict("The session has concluded"))
            }
        }
        if index >= self.puzzles.len() {
            return Err(CommandError::validation("Puzzle index out of range"));
        }
        let puzzle = &self.puzzles[index];
        puzzle
            .validate()
            .map_err(|e| CommandError::Validation(e.to_string()))?;

        let fresh =
            Attempt::new(puzzle).map_err(|e| CommandError::Internal(e.to_string()))?;
        for player in self.players.values_mut() {
            player.attempt = Some(fresh.clone());
            player.last_move = None;
            player.last_move_at = None;
            player.completed_at = None;
        }

        self.phase = Phase::PuzzleActive;
        self.active_index = Some(index);
        self.launched_at = Some(now);

        Ok(LaunchOutcome {
            puzzle_index: index,
            puzzle: self.puzzle_view(index),
            end_time: self.deadline_ms().unwrap_or_default(),
        })
    }

    /// Judge one submitted move. The deadline is advisory — submissions are
    /// accepted until results are revealed.
    pub fn submit_move(
        &mut self,
        conn: ConnectionId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<MoveOutcome, CommandError> {
        if self.phase != Phase::PuzzleActive {
            return Err(CommandError::conflict(
                "No active puzzle — moves are not being accepted",
            ));
        }
        let index = self
            .active_index
            .ok_or_else(|| CommandError::Internal("active phase without index".into()))?;
        let puzzle = self.puzzles[index].clone();

        let player = self
            .players
            .get_mut(&conn)
            .ok_or(CommandError::NotAPlayer)?;
        let attempt = player
            .attempt
            .as_mut()
            .ok_or_else(|| CommandError::Internal("player without attempt".into()))?;
        if attempt.concluded() {
            return Err(CommandError::conflict(
                "No more moves are accepted for this puzzle",
            ));
        }

        let submitted = line::normalize_move(raw).to_string();
        let expected = attempt.expected_token(&puzzle).map(str::to_string);
        player.last_move = Some(submitted.clone());
        player.last_move_at = Some(now);

        let verdict = judge::judge_move(attempt, &puzzle, &submitted);
        let launched_at = self.launched_at;

        let kind = match verdict {
            Verdict::Progress { reply, .. } => MoveOutcomeKind::Progress {
                new_position: reply.position_after,
                opponent_move: reply.san,
            },
            Verdict::Solved {
                reply,
                final_position,
                ..
            } => {
                player.completed_at = Some(now);
                let elapsed_ms = launched_at
                    .map(|l| (now - l).num_milliseconds())
                    .unwrap_or_default();
                MoveOutcomeKind::Completed {
                    opponent_move: reply.map(|r| r.san),
                    final_position,
                    elapsed_ms,
                }
            }
            Verdict::Incorrect { .. } => {
                player.completed_at = Some(now);
                MoveOutcomeKind::Failed { expected }
            }
            Verdict::BrokenLine {
                line_id,
                reply_token,
            } => {
                player.completed_at = Some(now);
                let line_label = puzzle
                    .line(line_id)
                    .map(|l| l.label.clone())
                    .unwrap_or_else(|| format!("line {line_id}"));
                MoveOutcomeKind::BrokenPuzzle {
                    line_label,
                    reply_token,
                }
            }
        };

        Ok(MoveOutcome {
            player_id: conn,
            nickname: player.nickname.clone(),
            submitted,
            at_ms: now.timestamp_millis(),
            kind,
        })
    }

    pub fn reveal_results(
        &mut self,
        caller: ConnectionId,
        index: usize,
        _now: DateTime<Utc>,
    ) -> Result<RevealOutcome, CommandError> {
        self.authorize_admin(caller)?;
        if self.phase != Phase::PuzzleActive {
            return Err(CommandError::conflict("No active puzzle to reveal"));
        }
        let active = self
            .active_index
            .ok_or_else(|| CommandError::Internal("active phase without index".into()))?;
        if index != active {
            return Err(CommandError::validation(
                "Puzzle index does not match the active puzzle",
            ));
        }

        self.phase = Phase::ResultsRevealed;
        let puzzle = &self.puzzles[active];
        let launched_at = self.launched_at;

        let mut player_results = Vec::with_capacity(self.players.len());
        for player in self.players.values_mut() {
            let succeeded_line = player.attempt.as_ref().and_then(|a| match a.status {
                AttemptStatus::Succeeded { line_id } => puzzle.line(line_id),
                _ => None,
            });

            let mut awarded = 0.0;
            let mut time_taken = None;
            if let (Some(done), Some(completed), Some(launched)) =
                (succeeded_line, player.completed_at, launched_at)
            {
                let elapsed = (completed - launched).num_milliseconds() as f64 / 1000.0;
                awarded = score::award_points(
                    done.points,
                    puzzle.timer_secs,
                    elapsed,
                    self.bonus_multiplier,
                );
                player.score = score::round2(player.score + awarded);
                let clamped = elapsed.clamp(0.0, f64::from(puzzle.timer_secs));
                time_taken = Some((clamped * 10.0).round() / 10.0);
            }

            player_results.push(PlayerResult {
                player_id: player.conn,
                nickname: player.nickname.clone(),
                answer: player
                    .last_move
                    .clone()
                    .unwrap_or_else(|| "(no answer)".to_string()),
                is_correct: succeeded_line.is_some(),
                points_awarded: awarded,
                time_taken,
            });
        }

        let solution_lines = puzzle
            .lines
            .iter()
            .map(|l| SolutionLineView {
                label: l.label.clone(),
                moves: l.moves.clone(),
                points: l.points,
            })
            .collect();

        self.rebuild_leaderboard();

        Ok(RevealOutcome {
            puzzle_index: active,
            solution_lines,
            leaderboard: self.leaderboard.clone(),
            player_results,
        })
    }

    pub fn advance(&mut self, caller: ConnectionId) -> Result<AdvanceOutcome, CommandError> {
        self.authorize_admin(caller)?;
        if self.phase != Phase::ResultsRevealed {
            return Err(CommandError::conflict(
                "Results must be revealed before advancing",
            ));
        }
        let current = self
            .active_index
            .ok_or_else(|| CommandError::Internal("revealed phase without index".into()))?;
        let next = current + 1;
        if next < self.puzzles.len() {
            self.phase = Phase::Configuring;
            Ok(AdvanceOutcome::Next {
                next_puzzle_index: next,
                total_puzzles: self.puzzles.len(),
            })
        } else {
            self.phase = Phase::Concluded;
            Ok(AdvanceOutcome::Concluded {
                leaderboard: self.leaderboard.clone(),
            })
        }
    }

    fn rebuild_leaderboard(&mut self) {
        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .values()
            .map(|p| LeaderboardEntry {
                id: p.conn,
                nickname: p.nickname.clone(),
                score: score::round2(p.score),
            })
            .collect();
        // Stable sort: ties keep join order
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.leaderboard = entries;
    }
}
