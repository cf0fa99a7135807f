//! Configured game creation (`POST /games/create_configured`).

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::ids::SessionId;

/// Strategy the server uses to play a bot seat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotAlgorithm {
    #[default]
    Random,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSeat {
    pub name: String,
    pub algorithm: BotAlgorithm,
}

impl BotSeat {
    pub fn random(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            algorithm: BotAlgorithm::Random,
        }
    }
}

/// Seats requested when creating a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSetup {
    pub human_players: usize,
    pub bot_players: Vec<BotSeat>,
}

impl GameSetup {
    /// Buraco is played head-to-head or in two pairs.
    pub const ALLOWED_TABLE_SIZES: [usize; 2] = [2, 4];

    pub fn new(human_players: usize, bot_players: Vec<BotSeat>) -> Self {
        Self {
            human_players,
            bot_players,
        }
    }

    /// A table of `count` random bots named `Bot 1..=count`.
    pub fn bots_only(count: usize) -> Self {
        Self::with_bots(0, count)
    }

    /// `humans` open seats plus `bots` random bots named `Bot 1..=bots`.
    pub fn with_bots(humans: usize, bots: usize) -> Self {
        let bot_players = (1..=bots)
            .map(|n| BotSeat::random(format!("Bot {n}")))
            .collect();
        Self::new(humans, bot_players)
    }

    pub fn total_players(&self) -> usize {
        self.human_players + self.bot_players.len()
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        let total = self.total_players();
        if !Self::ALLOWED_TABLE_SIZES.contains(&total) {
            return Err(SetupError::PlayerCount { total });
        }
        if let Some(index) = self
            .bot_players
            .iter()
            .position(|bot| bot.name.trim().is_empty())
        {
            return Err(SetupError::EmptyBotName { index });
        }
        Ok(())
    }
}

/// Response body of the create endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedGame {
    pub game_id: SessionId,
}
