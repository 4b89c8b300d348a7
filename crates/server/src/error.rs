//! Command error taxonomy. Every failed command is surfaced only to the
//! offending caller as a terse `error` message; session state is unchanged.

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Not authorized for this session")]
    Unauthorized,

    #[error("Game session not found")]
    SessionNotFound,

    #[error("You are not a player in this session")]
    NotAPlayer,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommandError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CommandError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CommandError::Conflict(msg.into())
    }
}
