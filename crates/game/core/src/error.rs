//! Error types raised while decoding wire payloads or validating a game setup.

use thiserror::Error;

/// Failure to turn an inbound frame into an [`Inbound`](crate::Inbound).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A game configuration rejected locally, before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("a game needs 2 or 4 players, got {total}")]
    PlayerCount { total: usize },

    #[error("bot seat {index} has an empty name")]
    EmptyBotName { index: usize },
}
