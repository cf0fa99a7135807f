//! Cards, melds, and the draw pile.
//!
//! Ranks and suits stay as the strings the server sends. Display is the only
//! place the client interprets them.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::MeldId;

const JOKER: &str = "Joker";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: String,
    pub suit: String,
}

impl Card {
    pub fn new(rank: impl Into<String>, suit: impl Into<String>) -> Self {
        Self {
            rank: rank.into(),
            suit: suit.into(),
        }
    }

    pub fn is_joker(&self) -> bool {
        self.rank == JOKER
    }

    /// Unicode symbol for the suit, or `None` for suits the client doesn't know.
    pub fn suit_symbol(&self) -> Option<char> {
        match self.suit.as_str() {
            "Hearts" => Some('♥'),
            "Diamonds" => Some('♦'),
            "Clubs" => Some('♣'),
            "Spades" => Some('♠'),
            _ => None,
        }
    }
}

impl fmt::Display for Card {
    /// `7♦`, `K♠`, `🃏` for jokers, `rank of suit` for unknown suits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_joker() {
            return f.write_str("🃏");
        }
        match self.suit_symbol() {
            Some(symbol) => write!(f, "{}{}", self.rank, symbol),
            None => write!(f, "{} of {}", self.rank, self.suit),
        }
    }
}

/// A run or set laid down on the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    pub id: MeldId,
    pub cards: Vec<Card>,
}

/// The face-down draw pile.
///
/// The server sends the cards themselves; the client only ever looks at how
/// many are left.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_suit_symbols() {
        assert_eq!(Card::new("7", "Diamonds").to_string(), "7♦");
        assert_eq!(Card::new("K", "Spades").to_string(), "K♠");
        assert_eq!(Card::new("Joker", "None").to_string(), "🃏");
        assert_eq!(Card::new("3", "Stars").to_string(), "3 of Stars");
    }

    #[test]
    fn deck_reports_cardinality_only() {
        let deck: Deck = serde_json::from_str(
            r#"{"cards":[{"rank":"2","suit":"Clubs"},{"rank":"A","suit":"Hearts"}]}"#,
        )
        .unwrap();
        assert_eq!(deck.len(), 2);
        assert!(Deck::default().is_empty());
    }
}
