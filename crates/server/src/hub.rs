//! The hub owns every session and processes commands from all connections
//! in arrival order on a single task. Session invariants never need locks:
//! each command runs to completion before the next is handled. Connections
//! hand the hub an unbounded sender at attach time and receive events
//! through it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;

use crate::activity::ActivityLog;
use crate::error::CommandError;
use crate::protocol::{ClientMessage, PlayerSummary, ProgressStatus, ServerMessage};
use crate::session::{
    AdvanceOutcome, ConnectionId, MoveOutcomeKind, Session, SessionRegistry,
};

pub enum HubCommand {
    Connect {
        conn: ConnectionId,
        user: String,
        tx: mpsc::UnboundedSender<ServerMessage>,
    },
    Disconnect {
        conn: ConnectionId,
    },
    Inbound {
        conn: ConnectionId,
        message: ClientMessage,
    },
}

/// Cheap clonable handle the WebSocket layer uses to feed the hub.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
    next_conn: Arc<AtomicU64>,
}

impl HubHandle {
    pub fn connect(
        &self,
        user: String,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> ConnectionId {
        let conn = ConnectionId(self.next_conn.fetch_add(1, Ordering::Relaxed));
        let _ = self.tx.send(HubCommand::Connect { conn, user, tx });
        conn
    }

    pub fn disconnect(&self, conn: ConnectionId) {
        let _ = self.tx.send(HubCommand::Disconnect { conn });
    }

    pub fn inbound(&self, conn: ConnectionId, message: ClientMessage) {
        let _ = self.tx.send(HubCommand::Inbound { conn, message });
    }
}

struct ConnHandle {
    user: String,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

pub struct Hub {
    registry: SessionRegistry,
    conns: HashMap<ConnectionId, ConnHandle>,
    log: ActivityLog,
    bonus_multiplier: f64,
}

impl Hub {
    pub fn new(bonus_multiplier: f64, log: ActivityLog) -> Self {
        Self {
            registry: SessionRegistry::new(),
            conns: HashMap::new(),
            log,
            bonus_multiplier,
        }
    }

    /// Spawn the hub task and return the handle connections use.
    pub fn spawn(bonus_multiplier: f64, log: ActivityLog) -> HubHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Hub::new(bonus_multiplier, log);
        tokio::spawn(hub.run(rx));
        HubHandle {
            tx,
            next_conn: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<HubCommand>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
    }

    pub fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect { conn, user, tx } => {
                tracing::info!("Client connected: user={user} conn={conn}");
                self.conns.insert(conn, ConnHandle { user, tx });
            }
            HubCommand::Disconnect { conn } => self.handle_disconnect(conn),
            HubCommand::Inbound { conn, message } => {
                if let Err(e) = self.handle_message(conn, message) {
                    self.send(conn, ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    fn send(&self, to: ConnectionId, message: ServerMessage) {
        if let Some(handle) = self.conns.get(&to) {
            // A closed receiver just means the socket is gone
            let _ = handle.tx.send(message);
        }
    }

    fn send_all(&self, recipients: &[ConnectionId], message: &ServerMessage) {
        for conn in recipients {
            self.send(*conn, message.clone());
        }
    }

    fn room_of(session: &Session) -> Vec<ConnectionId> {
        let mut room: Vec<ConnectionId> = session.players.keys().copied().collect();
        room.push(session.admin_conn);
        room
    }

    fn user_of(&self, conn: ConnectionId) -> String {
        self.conns
            .get(&conn)
            .map(|h| h.user.clone())
            .unwrap_or_default()
    }

    fn handle_message(
        &mut self,
        conn: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), CommandError> {
        match message {
            ClientMessage::CreateSession { num_puzzles } => {
                let user = self.user_of(conn);
                let session =
                    self.registry
                        .create(conn, user.clone(), num_puzzles, self.bonus_multiplier)?;
                let session_id = session.id.clone();
                tracing::info!("Session created: {session_id} by user {user} (conn {conn})");
                self.log.record(
                    "SESSION_CREATED",
                    json!({ "sessionId": &session_id, "adminUserId": &user, "numPuzzles": num_puzzles }),
                );
                self.send(conn, ServerMessage::SessionCreated { session_id });
                Ok(())
            }

            ClientMessage::UpdatePuzzle {
                session_id,
                puzzle_index,
                puzzle,
            } => {
                let session = self.registry.get_mut(&session_id)?;
                session.update_puzzle(conn, puzzle_index, puzzle)?;
                self.log.record(
                    "PUZZLE_UPDATED",
                    json!({ "sessionId": &session_id, "puzzleIndex": puzzle_index }),
                );
                Ok(())
            }

            ClientMessage::JoinSession {
                session_id,
                nickname,
            } => {
                let session = self.registry.get_mut(&session_id)?;
                let outcome = session.join(conn, &nickname)?;
                let room = Self::room_of(session);

                self.log.record(
                    "PLAYER_JOINED",
                    json!({
                        "sessionId": &session_id,
                        "playerId": outcome.player_id,
                        "nickname": &outcome.nickname,
                    }),
                );
                self.send(
                    conn,
                    ServerMessage::SessionJoined {
                        session_id,
                        nickname: outcome.nickname.clone(),
                        players: outcome.players.clone(),
                        puzzle_active: outcome.puzzle_active,
                        current_puzzle: outcome.current_puzzle,
                        end_time: outcome.end_time,
                    },
                );
                self.send_all(
                    &room,
                    &ServerMessage::PlayerJoined {
                        player_id: outcome.player_id,
                        nickname: outcome.nickname,
                        players: outcome.players,
                    },
                );
                Ok(())
            }

            ClientMessage::LaunchPuzzle {
                session_id,
                puzzle_index,
            } => {
                let now = Utc::now();
                let session = self.registry.get_mut(&session_id)?;
                let outcome = session.launch(conn, puzzle_index, now)?;
                let room = Self::room_of(session);

                tracing::info!(
                    "Puzzle {puzzle_index} launched in session {session_id}"
                );
                self.log.record(
                    "PUZZLE_LAUNCHED",
                    json!({ "sessionId": &session_id, "puzzleIndex": puzzle_index }),
                );
                self.send_all(
                    &room,
                    &ServerMessage::PuzzleLaunched {
                        puzzle: outcome.puzzle,
                        end_time: outcome.end_time,
                    },
                );
                Ok(())
            }

            ClientMessage::SubmitMove { session_id, mv } => {
                let now = Utc::now();
                let session = self.registry.get_mut(&session_id)?;
                let outcome = session.submit_move(conn, &mv, now)?;
                let room = Self::room_of(session);
                let admin = session.admin_conn;

                self.log.record(
                    "PLAYER_ATTEMPTED_MOVE",
                    json!({
                        "sessionId": &session_id,
                        "playerId": outcome.player_id,
                        "nickname": &outcome.nickname,
                        "move": &outcome.submitted,
                    }),
                );

                match outcome.kind {
                    MoveOutcomeKind::Progress {
                        new_position,
                        opponent_move,
                    } => {
                        self.send(
                            conn,
                            ServerMessage::StepSuccess {
                                new_position,
                                opponent_move: opponent_move.clone(),
                                next_step_expected: true,
                            },
                        );
                        self.send(
                            admin,
                            ServerMessage::AdminProgress {
                                player_id: outcome.player_id,
                                nickname: outcome.nickname,
                                attempted_move: outcome.submitted,
                                status: ProgressStatus::SolvingCorrectStep,
                                timestamp: outcome.at_ms,
                                opponent_move: Some(opponent_move),
                                next_step_expected: Some(true),
                                expected_move: None,
                            },
                        );
                    }
                    MoveOutcomeKind::Completed {
                        opponent_move,
                        final_position,
                        elapsed_ms,
                    } => {
                        if let Some(reply) = &opponent_move {
                            self.send(
                                conn,
                                ServerMessage::StepSuccess {
                                    new_position: final_position.clone(),
                                    opponent_move: reply.clone(),
                                    next_step_expected: false,
                                },
                            );
                        }
                        self.send_all(
                            &room,
                            &ServerMessage::SequenceCompleted {
                                player_id: outcome.player_id,
                                nickname: outcome.nickname.clone(),
                                final_position,
                                elapsed_ms,
                            },
                        );
                        self.send(
                            admin,
                            ServerMessage::AdminProgress {
                                player_id: outcome.player_id,
                                nickname: outcome.nickname,
                                attempted_move: outcome.submitted,
                                status: ProgressStatus::SolvingCorrectStep,
                                timestamp: outcome.at_ms,
                                opponent_move,
                                next_step_expected: Some(false),
                                expected_move: None,
                            },
                        );
                    }
                    MoveOutcomeKind::Failed { expected } => {
                        self.send(
                            conn,
                            ServerMessage::StepFailed {
                                attempted_move: outcome.submitted.clone(),
                            },
                        );
                        self.send_all(
                            &room,
                            &ServerMessage::SequenceFailed {
                                player_id: outcome.player_id,
                                nickname: outcome.nickname.clone(),
                                last_attempted_move: Some(outcome.submitted.clone()),
                            },
                        );
                        self.send(
                            admin,
                            ServerMessage::AdminProgress {
                                player_id: outcome.player_id,
                                nickname: outcome.nickname,
                                attempted_move: outcome.submitted,
                                status: ProgressStatus::SolvingIncorrectStep,
                                timestamp: outcome.at_ms,
                                opponent_move: None,
                                next_step_expected: None,
                                expected_move: expected,
                            },
                        );
                    }
                    MoveOutcomeKind::BrokenPuzzle {
                        line_label,
                        reply_token,
                    } => {
                        tracing::error!(
                            "Broken puzzle in session {session_id}: reply \"{reply_token}\" of {line_label} is illegal"
                        );
                        // Not the player's fault — a distinct message, not a
                        // step-failed judgment
                        self.send(
                            conn,
                            ServerMessage::Error {
                                message:
                                    "Puzzle definition error: the configured opponent reply is illegal. Contact the session administrator."
                                        .to_string(),
                            },
                        );
                        self.send_all(
                            &room,
                            &ServerMessage::SequenceFailed {
                                player_id: outcome.player_id,
                                nickname: outcome.nickname.clone(),
                                last_attempted_move: Some(outcome.submitted.clone()),
                            },
                        );
                        self.send(
                            admin,
                            ServerMessage::Error {
                                message: format!(
                                    "Configuration error in \"{line_label}\": opponent reply \"{reply_token}\" is illegal from the reached position"
                                ),
                            },
                        );
                        self.send(
                            admin,
                            ServerMessage::AdminProgress {
                                player_id: outcome.player_id,
                                nickname: outcome.nickname,
                                attempted_move: outcome.submitted,
                                status: ProgressStatus::ConfigurationError,
                                timestamp: outcome.at_ms,
                                opponent_move: None,
                                next_step_expected: None,
                                expected_move: Some(reply_token),
                            },
                        );
                    }
                }
                Ok(())
            }

            ClientMessage::RevealResults {
                session_id,
                puzzle_index,
            } => {
                let now = Utc::now();
                let session = self.registry.get_mut(&session_id)?;
                let outcome = session.reveal_results(conn, puzzle_index, now)?;
                let room = Self::room_of(session);

                self.log.record(
                    "RESULTS_REVEALED",
                    json!({ "sessionId": &session_id, "puzzleIndex": outcome.puzzle_index }),
                );
                self.send_all(
                    &room,
                    &ServerMessage::ResultsRevealed {
                        solution_lines: outcome.solution_lines,
                        leaderboard: outcome.leaderboard,
                        player_results: outcome.player_results,
                    },
                );
                Ok(())
            }

            ClientMessage::NextPuzzle { session_id } => {
                let session = self.registry.get_mut(&session_id)?;
                let outcome = session.advance(conn)?;
                let room = Self::room_of(session);

                match outcome {
                    AdvanceOutcome::Next {
                        next_puzzle_index,
                        total_puzzles,
                    } => {
                        self.log.record(
                            "ADVANCED_TO_NEXT_PUZZLE",
                            json!({ "sessionId": &session_id, "nextPuzzleIndex": next_puzzle_index }),
                        );
                        self.send_all(
                            &room,
                            &ServerMessage::AdvancedToNextPuzzle {
                                next_puzzle_index,
                                total_puzzles,
                            },
                        );
                    }
                    AdvanceOutcome::Concluded { leaderboard } => {
                        self.log.record(
                            "SESSION_CONCLUDED",
                            json!({ "sessionId": &session_id }),
                        );
                        self.send_all(
                            &room,
                            &ServerMessage::SessionConcluded {
                                message: "All puzzles have been completed.".to_string(),
                                leaderboard,
                            },
                        );
                    }
                }
                Ok(())
            }

            ClientMessage::TerminateSession { session_id } => {
                let session = self.registry.get(&session_id)?;
                session.authorize_admin(conn)?;
                let room = Self::room_of(session);
                self.registry.remove(&session_id);

                tracing::info!("Session {session_id} terminated by its admin");
                self.log.record(
                    "SESSION_TERMINATED",
                    json!({ "sessionId": &session_id }),
                );
                self.send_all(
                    &room,
                    &ServerMessage::SessionTerminated {
                        message: "The session has been terminated by the administrator."
                            .to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    fn handle_disconnect(&mut self, conn: ConnectionId) {
        tracing::info!("Client disconnected: conn={conn}");
        self.conns.remove(&conn);

        // Sessions are retained when their admin drops; players are told so
        // the room can wind down or wait for a new session.
        type Departure = (String, ConnectionId, String, Vec<PlayerSummary>, Vec<ConnectionId>);
        let mut admin_notices: Vec<Vec<ConnectionId>> = Vec::new();
        let mut departures: Vec<Departure> = Vec::new();

        for session in self.registry.iter_mut() {
            if session.admin_conn == conn {
                admin_notices.push(Self::room_of(session));
            } else if let Some(player) = session.remove_player(conn) {
                departures.push((
                    session.id.clone(),
                    player.conn,
                    player.nickname,
                    session.players_summary(),
                    Self::room_of(session),
                ));
            }
        }

        for room in admin_notices {
            self.send_all(
                &room,
                &ServerMessage::AdminDisconnected {
                    message: "The administrator has disconnected. The session may end soon."
                        .to_string(),
                },
            );
        }
        for (session_id, player_id, nickname, players, room) in departures {
            self.log.record(
                "PLAYER_DISCONNECTED",
                json!({ "sessionId": &session_id, "playerId": player_id, "nickname": &nickname }),
            );
            self.send_all(
                &room,
                &ServerMessage::PlayerLeft {
                    player_id,
                    nickname,
                    players,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PuzzleDraft;
    use puzzle_core::board::STANDARD_START_FEN;

    struct TestClient {
        conn: ConnectionId,
        rx: mpsc::UnboundedReceiver<ServerMessage>,
    }

    impl TestClient {
        fn recv(&mut self) -> ServerMessage {
            self.rx.try_recv().expect("expected a message")
        }

        fn drain(&mut self) {
            while self.rx.try_recv().is_ok() {}
        }

        fn assert_empty(&mut self) {
            assert!(self.rx.try_recv().is_err(), "expected no message");
        }
    }

    fn connect(hub: &mut Hub, id: u64, user: &str) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = ConnectionId(id);
        hub.handle(HubCommand::Connect {
            conn,
            user: user.to_string(),
            tx,
        });
        TestClient { conn, rx }
    }

    fn inbound(hub: &mut Hub, client: &TestClient, message: ClientMessage) {
        hub.handle(HubCommand::Inbound {
            conn: client.conn,
            message,
        });
    }

    fn create_session(hub: &mut Hub, admin: &mut TestClient, num_puzzles: usize) -> String {
        inbound(
            hub,
            admin,
            ClientMessage::CreateSession { num_puzzles },
        );
        match admin.recv() {
            ServerMessage::SessionCreated { session_id } => session_id,
            other => panic!("expected session_created, got {other:?}"),
        }
    }

    fn simple_draft() -> PuzzleDraft {
        serde_json::from_value(serde_json::json!({
            "position": STANDARD_START_FEN,
            "solutionLines": [{ "moves": "e4 e5", "points": 100.0 }],
            "timer": 60,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_join_launch_solve_reveal_flow() {
        let mut hub = Hub::new(1.0, ActivityLog::disabled());
        let mut admin = connect(&mut hub, 1, "admin-user");
        let mut alice = connect(&mut hub, 2, "alice-user");

        let session_id = create_session(&mut hub, &mut admin, 1);

        inbound(
            &mut hub,
            &admin,
            ClientMessage::UpdatePuzzle {
                session_id: session_id.clone(),
                puzzle_index: 0,
                puzzle: simple_draft(),
            },
        );

        inbound(
            &mut hub,
            &alice,
            ClientMessage::JoinSession {
                session_id: session_id.clone(),
                nickname: "alice".into(),
            },
        );
        assert!(matches!(alice.recv(), ServerMessage::SessionJoined { .. }));
        // Both room members see the join
        assert!(matches!(alice.recv(), ServerMessage::PlayerJoined { .. }));
        assert!(matches!(admin.recv(), ServerMessage::PlayerJoined { .. }));

        inbound(
            &mut hub,
            &admin,
            ClientMessage::LaunchPuzzle {
                session_id: session_id.clone(),
                puzzle_index: 0,
            },
        );
        assert!(matches!(admin.recv(), ServerMessage::PuzzleLaunched { .. }));
        assert!(matches!(alice.recv(), ServerMessage::PuzzleLaunched { .. }));

        inbound(
            &mut hub,
            &alice,
            ClientMessage::SubmitMove {
                session_id: session_id.clone(),
                mv: "e4".into(),
            },
        );
        match alice.recv() {
            ServerMessage::StepSuccess {
                opponent_move,
                next_step_expected,
                ..
            } => {
                assert_eq!(opponent_move, "e5");
                assert!(!next_step_expected);
            }
            other => panic!("expected step_success, got {other:?}"),
        }
        assert!(matches!(
            alice.recv(),
            ServerMessage::SequenceCompleted { .. }
        ));
        assert!(matches!(
            admin.recv(),
            ServerMessage::SequenceCompleted { .. }
        ));
        assert!(matches!(admin.recv(), ServerMessage::AdminProgress { .. }));

        inbound(
            &mut hub,
            &admin,
            ClientMessage::RevealResults {
                session_id: session_id.clone(),
                puzzle_index: 0,
            },
        );
        match alice.recv() {
            ServerMessage::ResultsRevealed {
                leaderboard,
                player_results,
                solution_lines,
            } => {
                assert_eq!(leaderboard[0].nickname, "alice");
                assert!(leaderboard[0].score > 100.0);
                assert!(player_results[0].is_correct);
                assert_eq!(solution_lines[0].moves, vec!["e4", "e5"]);
            }
            other => panic!("expected results_revealed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admin_telemetry_goes_only_to_admin() {
        let mut hub = Hub::new(1.0, ActivityLog::disabled());
        let mut admin = connect(&mut hub, 1, "admin-user");
        let mut alice = connect(&mut hub, 2, "alice-user");
        let mut bob = connect(&mut hub, 3, "bob-user");

        let session_id = create_session(&mut hub, &mut admin, 1);
        inbound(
            &mut hub,
            &admin,
            ClientMessage::UpdatePuzzle {
                session_id: session_id.clone(),
                puzzle_index: 0,
                puzzle: simple_draft(),
            },
        );
        for client in [&alice, &bob] {
            inbound(
                &mut hub,
                client,
                ClientMessage::JoinSession {
                    session_id: session_id.clone(),
                    nickname: format!("nick-{}", client.conn),
                },
            );
        }
        inbound(
            &mut hub,
            &admin,
            ClientMessage::LaunchPuzzle {
                session_id: session_id.clone(),
                puzzle_index: 0,
            },
        );
        admin.drain();
        alice.drain();
        bob.drain();

        // A wrong move: the submitter gets step feedback, the room the
        // failure, and only the admin the expected-move telemetry
        inbound(
            &mut hub,
            &alice,
            ClientMessage::SubmitMove {
                session_id: session_id.clone(),
                mv: "d4".into(),
            },
        );

        assert!(matches!(alice.recv(), ServerMessage::StepFailed { .. }));
        assert!(matches!(alice.recv(), ServerMessage::SequenceFailed { .. }));
        alice.assert_empty();

        assert!(matches!(bob.recv(), ServerMessage::SequenceFailed { .. }));
        bob.assert_empty();

        assert!(matches!(admin.recv(), ServerMessage::SequenceFailed { .. }));
        match admin.recv() {
            ServerMessage::AdminProgress {
                status,
                expected_move,
                ..
            } => {
                assert_eq!(status, ProgressStatus::SolvingIncorrectStep);
                assert_eq!(expected_move.as_deref(), Some("e4"));
            }
            other => panic!("expected admin_progress, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn errors_go_only_to_the_offending_caller() {
        let mut hub = Hub::new(1.0, ActivityLog::disabled());
        let mut admin = connect(&mut hub, 1, "admin-user");
        let mut alice = connect(&mut hub, 2, "alice-user");

        let session_id = create_session(&mut hub, &mut admin, 1);
        inbound(
            &mut hub,
            &alice,
            ClientMessage::JoinSession {
                session_id: session_id.clone(),
                nickname: "alice".into(),
            },
        );
        admin.drain();
        alice.drain();

        // Non-admin tries to launch
        inbound(
            &mut hub,
            &alice,
            ClientMessage::LaunchPuzzle {
                session_id: session_id.clone(),
                puzzle_index: 0,
            },
        );
        assert!(matches!(alice.recv(), ServerMessage::Error { .. }));
        admin.assert_empty();

        // Unknown session
        inbound(
            &mut hub,
            &alice,
            ClientMessage::SubmitMove {
                session_id: "nosuch".into(),
                mv: "e4".into(),
            },
        );
        match alice.recv() {
            ServerMessage::Error { message } => {
                assert!(message.contains("not found"), "got {message}");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn terminate_notifies_room_and_destroys_session() {
        let mut hub = Hub::new(1.0, ActivityLog::disabled());
        let mut admin = connect(&mut hub, 1, "admin-user");
        let mut alice = connect(&mut hub, 2, "alice-user");

        let session_id = create_session(&mut hub, &mut admin, 1);
        inbound(
            &mut hub,
            &alice,
            ClientMessage::JoinSession {
                session_id: session_id.clone(),
                nickname: "alice".into(),
            },
        );
        admin.drain();
        alice.drain();

        inbound(
            &mut hub,
            &admin,
            ClientMessage::TerminateSession {
                session_id: session_id.clone(),
            },
        );
        assert!(matches!(
            alice.recv(),
            ServerMessage::SessionTerminated { .. }
        ));
        assert!(matches!(
            admin.recv(),
            ServerMessage::SessionTerminated { .. }
        ));

        // The session is gone
        inbound(
            &mut hub,
            &alice,
            ClientMessage::JoinSession {
                session_id,
                nickname: "alice2".into(),
            },
        );
        assert!(matches!(alice.recv(), ServerMessage::Error { .. }));
    }

    #[tokio::test]
    async fn player_disconnect_notifies_room() {
        let mut hub = Hub::new(1.0, ActivityLog::disabled());
        let mut admin = connect(&mut hub, 1, "admin-user");
        let mut alice = connect(&mut hub, 2, "alice-user");

        let session_id = create_session(&mut hub, &mut admin, 1);
        inbound(
            &mut hub,
            &alice,
            ClientMessage::JoinSession {
                session_id: session_id.clone(),
                nickname: "alice".into(),
            },
        );
        admin.drain();

        hub.handle(HubCommand::Disconnect { conn: alice.conn });
        match admin.recv() {
            ServerMessage::PlayerLeft {
                nickname, players, ..
            } => {
                assert_eq!(nickname, "alice");
                assert!(players.is_empty());
            }
            other => panic!("expected player_left, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admin_disconnect_keeps_session_and_warns_players() {
        let mut hub = Hub::new(1.0, ActivityLog::disabled());
        let mut admin = connect(&mut hub, 1, "admin-user");
        let mut alice = connect(&mut hub, 2, "alice-user");

        let session_id = create_session(&mut hub, &mut admin, 1);
        inbound(
            &mut hub,
            &alice,
            ClientMessage::JoinSession {
                session_id: session_id.clone(),
                nickname: "alice".into(),
            },
        );
        alice.drain();

        hub.handle(HubCommand::Disconnect { conn: admin.conn });
        assert!(matches!(
            alice.recv(),
            ServerMessage::AdminDisconnected { .. }
        ));

        // Session still exists — joining again under a new nickname works
        let mut carol = connect(&mut hub, 3, "carol-user");
        inbound(
            &mut hub,
            &carol,
            ClientMessage::JoinSession {
                session_id,
                nickname: "carol".into(),
            },
        );
        assert!(matches!(carol.recv(), ServerMessage::SessionJoined { .. }));
    }
}
