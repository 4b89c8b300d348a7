//! In-memory session registry with injected lifecycle — no module-level
//! singleton, so tests can run any number of independent instances.

use std::collections::HashMap;

use rand::distributions::Alphanumeric;
use rand::Rng;

use super::aggregate::{Session, MAX_PUZZLES};
use super::ConnectionId;
use crate::error::CommandError;

const SESSION_ID_LEN: usize = 6;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        admin_conn: ConnectionId,
        admin_user: String,
        num_puzzles: usize,
        bonus_multiplier: f64,
    ) -> Result<&Session, CommandError> {
        if num_puzzles == 0 || num_puzzles > MAX_PUZZLES {
            return Err(CommandError::Validation(format!(
                "Number of puzzles must be between 1 and {MAX_PUZZLES}"
            )));
        }
        let mut id = generate_id();
        while self.sessions.contains_key(&id) {
            id = generate_id();
        }
        let session = Session::new(id.clone(), admin_conn, admin_user, num_puzzles, bonus_multiplier);
        Ok(self.sessions.entry(id).or_insert(session))
    }

    pub fn get(&self, id: &str) -> Result<&Session, CommandError> {
        self.sessions.get(id).ok_or(CommandError::SessionNotFound)
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Session, CommandError> {
        self.sessions
            .get_mut(id)
            .ok_or(CommandError::SessionNotFound)
    }

    pub fn remove(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}
