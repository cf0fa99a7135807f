//! Full-state snapshot of a session, as served by `GET /games/{id}` and pushed
//! in `game_state_update` messages.

use serde::{Deserialize, Serialize};

use crate::card::{Card, Deck, Meld};
use crate::ids::{PlayerId, SessionId};

/// One seat at the table as seen in a snapshot.
///
/// Servers that do not send a seat `id` get the seat name as its identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PlayerViewWire")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub hand: Vec<Card>,
    #[serde(default)]
    pub melds: Vec<Meld>,
    #[serde(default)]
    pub score: i64,
    /// Whether the server plays this seat (a bot) rather than a human.
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Deserialize)]
struct PlayerViewWire {
    #[serde(default)]
    id: Option<PlayerId>,
    name: String,
    #[serde(default)]
    hand: Vec<Card>,
    #[serde(default)]
    melds: Vec<Meld>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    is_bot: bool,
}

impl From<PlayerViewWire> for PlayerView {
    fn from(wire: PlayerViewWire) -> Self {
        let id = wire
            .id
            .filter(|id| !id.as_str().is_empty())
            .unwrap_or_else(|| PlayerId::new(wire.name.as_str()));
        Self {
            id,
            name: wire.name,
            hand: wire.hand,
            melds: wire.melds,
            score: wire.score,
            is_bot: wire.is_bot,
        }
    }
}

/// Complete session state at one point in observed time.
///
/// Snapshots are always replaced wholesale, never merged; every field reflects
/// the same server-side moment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_id: SessionId,
    pub players: Vec<PlayerView>,
    #[serde(default)]
    pub deck: Deck,
    /// Ordered oldest first; the last card is the top of the pile.
    #[serde(default)]
    pub discard_pile: Vec<Card>,
    #[serde(default)]
    pub pots: Vec<Vec<Card>>,
    #[serde(default)]
    pub current_turn_player_index: usize,
    /// True once the session has left the join phase.
    #[serde(default)]
    pub game_started: bool,
}

impl GameSnapshot {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// True when there is at least one player and every one is automated.
    pub fn all_players_automated(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.is_bot)
    }

    pub fn top_discard(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    pub fn current_player(&self) -> Option<&PlayerView> {
        self.players.get(self.current_turn_player_index)
    }

    /// One-line summary used in log output.
    pub fn summary(&self) -> String {
        let turn = self
            .current_player()
            .map(|p| p.name.as_str())
            .unwrap_or("-");
        let top = self
            .top_discard()
            .map(ToString::to_string)
            .unwrap_or_else(|| "empty".to_string());
        let scores = self
            .players
            .iter()
            .map(|p| format!("{}={}", p.name, p.score))
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "game={} started={} turn={} deck={} discard_top={} pots={} scores[{}]",
            self.game_id,
            self.game_started,
            turn,
            self.deck.len(),
            top,
            self.pots.len(),
            scores
        )
    }
}

/// Identity record returned by `POST /games/{id}/join`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
}
