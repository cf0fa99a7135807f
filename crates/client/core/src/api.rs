//! Request/response boundary with the game service.
//!
//! The session never talks HTTP directly; it goes through [`GameApi`] so tests
//! can substitute an in-memory server and the real client can live in its own
//! crate.
use async_trait::async_trait;
use game_core::{GameSetup, GameSnapshot, PlayerRecord, SessionId};

use crate::error::Result;

#[async_trait]
pub trait GameApi: Send + Sync {
    /// `GET /games/{id}`: the full current state of a session.
    async fn fetch_snapshot(&self, session: &SessionId) -> Result<GameSnapshot>;

    /// `POST /games/{id}/join`: claim a seat and receive a player identity.
    async fn join_game(&self, session: &SessionId, player_name: &str) -> Result<PlayerRecord>;

    /// `POST /games/{id}/start`: leave the join phase.
    ///
    /// Success carries no state; the new state arrives on the stream.
    async fn start_game(&self, session: &SessionId) -> Result<()>;

    /// `POST /games/create_configured`: create a session with the given seats.
    async fn create_game(&self, setup: &GameSetup) -> Result<SessionId>;
}
