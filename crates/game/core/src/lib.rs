//! Wire and domain types for the Buraco client.
//!
//! `game-core` defines what moves across the boundary with the game service:
//! the full-state [`GameSnapshot`] pushed by the server, the [`Command`]s the
//! client sends, and the [`Inbound`] messages it receives. The rules engine
//! lives server-side, so these types carry data only and never validate
//! business meaning (what a legal meld is, whose turn it is).
pub mod card;
pub mod error;
pub mod ids;
pub mod message;
pub mod setup;
pub mod snapshot;

pub use card::{Card, Deck, Meld};
pub use error::{DecodeError, SetupError};
pub use ids::{MeldId, PlayerId, SessionId};
pub use message::{Command, Inbound, decode_inbound, encode_command};
pub use setup::{BotAlgorithm, BotSeat, CreatedGame, GameSetup};
pub use snapshot::{GameSnapshot, PlayerRecord, PlayerView};
