//! Real-time message vocabulary for the `/ws/{id}` endpoint.
//!
//! Outbound frames are tagged by `action`, inbound frames by `type`. Parsing is
//! kept apart from state handling: [`decode_inbound`] only classifies a frame,
//! and callers decide what a recognized message does to their state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::Card;
use crate::error::DecodeError;
use crate::ids::{MeldId, PlayerId};
use crate::snapshot::GameSnapshot;

const GAME_STATE_UPDATE: &str = "game_state_update";
const PLAYER_CONNECTED: &str = "player_connected";
const PLAYER_DISCONNECTED: &str = "player_disconnected";

/// A player intent sent to the server.
///
/// Commands are fire-and-forget: there is no correlation id, and the only
/// confirmation is the next state update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    DrawFromDeck {
        player_id: PlayerId,
    },
    DiscardCard {
        player_id: PlayerId,
        card: Card,
    },
    TakeDiscardPile {
        player_id: PlayerId,
    },
    /// Lays down a new meld when `target_meld_id` is `None`, extends the
    /// referenced meld otherwise.
    MeldCards {
        player_id: PlayerId,
        cards: Vec<Card>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_meld_id: Option<MeldId>,
    },
    /// Asks the server to advance a bot seat. Not tied to a player.
    #[serde(rename = "PLAY_BOT_TURN")]
    PlayBotTurn,
}

impl Command {
    /// Wire name of the action.
    pub fn action(&self) -> &'static str {
        match self {
            Command::DrawFromDeck { .. } => "draw_from_deck",
            Command::DiscardCard { .. } => "discard_card",
            Command::TakeDiscardPile { .. } => "take_discard_pile",
            Command::MeldCards { .. } => "meld_cards",
            Command::PlayBotTurn => "PLAY_BOT_TURN",
        }
    }

    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            Command::DrawFromDeck { player_id }
            | Command::DiscardCard { player_id, .. }
            | Command::TakeDiscardPile { player_id }
            | Command::MeldCards { player_id, .. } => Some(player_id),
            Command::PlayBotTurn => None,
        }
    }
}

pub fn encode_command(command: &Command) -> serde_json::Result<String> {
    serde_json::to_string(command)
}

/// A classified inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// Full-state replacement.
    StateUpdate(Box<GameSnapshot>),
    PlayerConnected(Value),
    PlayerDisconnected(Value),
    /// A well-formed envelope whose `type` this client does not handle.
    Unknown { kind: String },
}

impl Inbound {
    pub fn kind(&self) -> &str {
        match self {
            Inbound::StateUpdate(_) => GAME_STATE_UPDATE,
            Inbound::PlayerConnected(_) => PLAYER_CONNECTED,
            Inbound::PlayerDisconnected(_) => PLAYER_DISCONNECTED,
            Inbound::Unknown { kind } => kind,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Classifies one text frame.
///
/// Unknown `type` values decode successfully as [`Inbound::Unknown`]; only a
/// broken envelope or a malformed state payload is an error.
pub fn decode_inbound(text: &str) -> Result<Inbound, DecodeError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(DecodeError::Envelope)?;

    match envelope.kind.as_str() {
        GAME_STATE_UPDATE => serde_json::from_value::<GameSnapshot>(envelope.payload)
            .map(|snapshot| Inbound::StateUpdate(Box::new(snapshot)))
            .map_err(|source| DecodeError::Payload {
                kind: GAME_STATE_UPDATE,
                source,
            }),
        PLAYER_CONNECTED => Ok(Inbound::PlayerConnected(envelope.payload)),
        PLAYER_DISCONNECTED => Ok(Inbound::PlayerDisconnected(envelope.payload)),
        _ => Ok(Inbound::Unknown {
            kind: envelope.kind,
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn seven_of_diamonds() -> Card {
        Card::new("7", "Diamonds")
    }

    #[test]
    fn meld_extension_and_new_meld_are_distinguishable() {
        let player_id = PlayerId::new("p1");
        let new_meld = Command::MeldCards {
            player_id: player_id.clone(),
            cards: vec![seven_of_diamonds()],
            target_meld_id: None,
        };
        let extension = Command::MeldCards {
            player_id,
            cards: vec![seven_of_diamonds()],
            target_meld_id: Some(MeldId(3)),
        };

        let new_json: Value = serde_json::from_str(&encode_command(&new_meld).unwrap()).unwrap();
        let ext_json: Value = serde_json::from_str(&encode_command(&extension).unwrap()).unwrap();

        assert_eq!(
            new_json,
            json!({
                "action": "meld_cards",
                "player_id": "p1",
                "cards": [{"rank": "7", "suit": "Diamonds"}]
            })
        );
        assert_eq!(ext_json["target_meld_id"], json!(3));
        assert_ne!(new_json, ext_json);
    }

    #[test]
    fn command_tags_match_wire_names() {
        let player_id = PlayerId::new("p1");
        let commands = [
            Command::DrawFromDeck {
                player_id: player_id.clone(),
            },
            Command::DiscardCard {
                player_id: player_id.clone(),
                card: seven_of_diamonds(),
            },
            Command::TakeDiscardPile { player_id },
            Command::PlayBotTurn,
        ];

        for command in commands {
            let json: Value = serde_json::to_value(&command).unwrap();
            assert_eq!(json["action"], json!(command.action()));
        }
    }

    #[test]
    fn bot_turn_carries_no_player() {
        assert_eq!(
            encode_command(&Command::PlayBotTurn).unwrap(),
            r#"{"action":"PLAY_BOT_TURN"}"#
        );
        assert!(Command::PlayBotTurn.player_id().is_none());
    }

    #[test]
    fn unknown_types_are_classified_not_rejected() {
        let inbound = decode_inbound(r#"{"type":"chat","payload":{"text":"hi"}}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Unknown {
                kind: "chat".into()
            }
        );
        assert_eq!(inbound.kind(), "chat");
    }

    #[test]
    fn presence_payload_is_passed_through() {
        let inbound =
            decode_inbound(r#"{"type":"player_connected","payload":{"player":"Ana"}}"#).unwrap();
        assert_eq!(inbound, Inbound::PlayerConnected(json!({"player": "Ana"})));
        assert_eq!(inbound.kind(), "player_connected");
    }

    #[test]
    fn malformed_frames_are_decode_errors() {
        assert!(matches!(
            decode_inbound("not json"),
            Err(DecodeError::Envelope(_))
        ));
        assert!(matches!(
            decode_inbound(r#"{"type":"game_state_update","payload":{"players":"nope"}}"#),
            Err(DecodeError::Payload {
                kind: "game_state_update",
                ..
            })
        ));
    }
}
