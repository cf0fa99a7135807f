//! Translation of player intents into outbound commands.
//!
//! Every intent needs the local player identity. Until a join resolves it the
//! dispatcher silently drops intents, so UI controls can be wired up early.
use std::sync::{Arc, OnceLock};

use game_core::{Card, Command, MeldId, PlayerId};
use tracing::{debug, warn};

use crate::channel::CommandSink;

/// Shared slot for the local player identity. Written once.
#[derive(Clone, Debug, Default)]
pub struct IdentityCell {
    inner: Arc<OnceLock<PlayerId>>,
}

impl IdentityCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&PlayerId> {
        self.inner.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.get().is_some()
    }

    /// Resolves the identity. A second, different identity is ignored.
    pub fn resolve(&self, id: PlayerId) -> &PlayerId {
        let current = self.inner.get_or_init(|| id.clone());
        if *current != id {
            warn!(%current, rejected = %id, "player identity already resolved; keeping the first");
        }
        current
    }
}

/// What a player wants to do, before identity is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    CreateMeld { cards: Vec<Card> },
    AddToMeld { meld: MeldId, card: Card },
    DrawFromDeck,
    DiscardCard { card: Card },
    TakeDiscardPile,
}

impl Intent {
    pub fn into_command(self, player_id: PlayerId) -> Command {
        match self {
            Intent::CreateMeld { cards } => Command::MeldCards {
                player_id,
                cards,
                target_meld_id: None,
            },
            Intent::AddToMeld { meld, card } => Command::MeldCards {
                player_id,
                cards: vec![card],
                target_meld_id: Some(meld),
            },
            Intent::DrawFromDeck => Command::DrawFromDeck { player_id },
            Intent::DiscardCard { card } => Command::DiscardCard { player_id, card },
            Intent::TakeDiscardPile => Command::TakeDiscardPile { player_id },
        }
    }
}

/// Result of a dispatch call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    Suppressed(Suppression),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suppression {
    /// No local player identity yet.
    NoIdentity,
    /// No open channel to carry the command.
    NoChannel,
}

#[derive(Clone, Debug)]
pub struct ActionDispatcher {
    identity: IdentityCell,
    sink: CommandSink,
}

impl ActionDispatcher {
    pub fn new(identity: IdentityCell, sink: CommandSink) -> Self {
        Self { identity, sink }
    }

    /// Attaches the identity, or `None` when it is unresolved.
    pub fn translate(&self, intent: Intent) -> Option<Command> {
        let player = self.identity.get()?.clone();
        Some(intent.into_command(player))
    }

    pub async fn dispatch(&self, intent: Intent) -> Dispatch {
        let Some(command) = self.translate(intent) else {
            debug!("player identity unresolved; intent suppressed");
            return Dispatch::Suppressed(Suppression::NoIdentity);
        };
        self.send(command).await
    }

    /// Sends the bot-turn nudge. Needs no identity.
    pub async fn play_bot_turn(&self) -> Dispatch {
        self.send(Command::PlayBotTurn).await
    }

    pub async fn create_meld(&self, cards: Vec<Card>) -> Dispatch {
        self.dispatch(Intent::CreateMeld { cards }).await
    }

    pub async fn add_to_meld(&self, meld: MeldId, card: Card) -> Dispatch {
        self.dispatch(Intent::AddToMeld { meld, card }).await
    }

    pub async fn draw_from_deck(&self) -> Dispatch {
        self.dispatch(Intent::DrawFromDeck).await
    }

    pub async fn discard_card(&self, card: Card) -> Dispatch {
        self.dispatch(Intent::DiscardCard { card }).await
    }

    pub async fn take_discard_pile(&self) -> Dispatch {
        self.dispatch(Intent::TakeDiscardPile).await
    }

    async fn send(&self, command: Command) -> Dispatch {
        if self.sink.submit(command).await {
            Dispatch::Sent
        } else {
            Dispatch::Suppressed(Suppression::NoChannel)
        }
    }
}
