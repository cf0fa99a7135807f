//! Error taxonomy surfaced by the client core.
//!
//! Every failure that reaches the session store's error slot is a
//! [`ClientError`]. Variants carry strings rather than source errors so the
//! value can be cloned into the store and compared in tests.
use game_core::{SessionId, SetupError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("game {0} not found")]
    NotFound(SessionId),

    #[error("request conflicts with the state of game {0}")]
    Conflict(SessionId),

    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode payload: {0}")]
    Decode(String),

    #[error("real-time channel failure: {0}")]
    Channel(String),

    #[error("invalid game setup: {0}")]
    InvalidSetup(#[from] SetupError),

    #[error("game {0} is already open on this client")]
    AlreadyOpen(SessionId),
}

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request/response failures: fetch, join, create, start.
    Network,
    Decode,
    Channel,
    /// Rejected before anything was sent.
    Local,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NotFound(_)
            | ClientError::Conflict(_)
            | ClientError::Rejected { .. }
            | ClientError::Network(_) => ErrorKind::Network,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::Channel(_) => ErrorKind::Channel,
            ClientError::InvalidSetup(_) | ClientError::AlreadyOpen(_) => ErrorKind::Local,
        }
    }
}

impl From<game_core::DecodeError> for ClientError {
    fn from(err: game_core::DecodeError) -> Self {
        ClientError::Decode(err.to_string())
    }
}
