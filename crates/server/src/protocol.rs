//! Wire protocol: every inbound command and outbound event is a tagged
//! variant with a fixed payload schema, validated by serde at the boundary
//! before it reaches any session state.

use serde::{Deserialize, Serialize};

use crate::session::ConnectionId;

// ---- Inbound payload fragments ----

/// Admin-entered puzzle draft. Solution lines arrive as raw text and are
/// normalized into move tokens server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleDraft {
    pub position: String,
    pub solution_lines: Vec<LineDraft>,
    pub timer: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDraft {
    /// Raw move text, e.g. "1. Qh5 g6, 2. Qxg6".
    pub moves: String,
    pub points: f64,
    #[serde(default)]
    pub label: Option<String>,
}

// ---- Client → server commands ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateSession {
        num_puzzles: usize,
    },
    UpdatePuzzle {
        session_id: String,
        puzzle_index: usize,
        puzzle: PuzzleDraft,
    },
    JoinSession {
        session_id: String,
        nickname: String,
    },
    LaunchPuzzle {
        session_id: String,
        puzzle_index: usize,
    },
    SubmitMove {
        session_id: String,
        #[serde(rename = "move")]
        mv: String,
    },
    RevealResults {
        session_id: String,
        puzzle_index: usize,
    },
    NextPuzzle {
        session_id: String,
    },
    TerminateSession {
        session_id: String,
    },
}

// ---- Outbound payload fragments ----

/// What clients get to see of a launched puzzle. Never carries the
/// solution lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleView {
    pub position: String,
    pub timer: u32,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: ConnectionId,
    pub nickname: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: ConnectionId,
    pub nickname: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionLineView {
    pub label: String,
    pub moves: Vec<String>,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub player_id: ConnectionId,
    pub nickname: String,
    pub answer: String,
    pub is_correct: bool,
    pub points_awarded: f64,
    /// Solve time in seconds, one decimal, for display.
    pub time_taken: Option<f64>,
}

/// Per-attempt status in admin move telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    SolvingCorrectStep,
    SolvingIncorrectStep,
    ConfigurationError,
}

// ---- Server → client events ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    SessionCreated {
        session_id: String,
    },
    SessionJoined {
        session_id: String,
        nickname: String,
        players: Vec<PlayerSummary>,
        puzzle_active: bool,
        current_puzzle: Option<PuzzleView>,
        end_time: Option<i64>,
    },
    PlayerJoined {
        player_id: ConnectionId,
        nickname: String,
        players: Vec<PlayerSummary>,
    },
    PlayerLeft {
        player_id: ConnectionId,
        nickname: String,
        players: Vec<PlayerSummary>,
    },
    PuzzleLaunched {
        puzzle: PuzzleView,
        end_time: i64,
    },
    /// To the submitting player: correct step, opponent has replied.
    StepSuccess {
        new_position: String,
        opponent_move: String,
        next_step_expected: bool,
    },
    /// To the submitting player: wrong or illegal move.
    StepFailed {
        attempted_move: String,
    },
    SequenceCompleted {
        player_id: ConnectionId,
        nickname: String,
        final_position: String,
        elapsed_ms: i64,
    },
    SequenceFailed {
        player_id: ConnectionId,
        nickname: String,
        last_attempted_move: Option<String>,
    },
    /// Admin-only move telemetry.
    AdminProgress {
        player_id: ConnectionId,
        nickname: String,
        attempted_move: String,
        status: ProgressStatus,
        timestamp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        opponent_move: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_step_expected: Option<bool>,
        /// What the primary viable line expected — admin's eyes only.
        #[serde(skip_serializing_if = "Option::is_none")]
        expected_move: Option<String>,
    },
    ResultsRevealed {
        solution_lines: Vec<SolutionLineView>,
        leaderboard: Vec<LeaderboardEntry>,
        player_results: Vec<PlayerResult>,
    },
    AdvancedToNextPuzzle {
        next_puzzle_index: usize,
        total_puzzles: usize,
    },
    SessionConcluded {
        message: String,
        leaderboard: Vec<LeaderboardEntry>,
    },
    SessionTerminated {
        message: String,
    },
    AdminDisconnected {
        message: String,
    },
    Error {
        message: String,
    },
}
