use std::fmt;

use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod registry;

pub use aggregate::{
    AdvanceOutcome, JoinOutcome, LaunchOutcome, MoveOutcome, MoveOutcomeKind, Phase, Player,
    RevealOutcome, Session,
};
pub use registry::SessionRegistry;

/// Transport-level identity of one connected client. Distinct from the
/// user identity carried in the auth token; all session commands key off
/// the connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
