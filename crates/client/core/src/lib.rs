//! Client-side state synchronization and action dispatch for Buraco sessions.
//!
//! # Architecture
//!
//! ```text
//! GameClient ── open(session) ──► GameSession
//!                                   ├─→ SnapshotFetcher ─┐  (one-shot GET)
//!                                   ├─→ Channel ─────────┼─► SessionStore ─► readers
//!                                   │     ▲              │        │
//!                                   │     └ CommandSink ◄┼─ ActionDispatcher
//!                                   └─→ AutoStartMonitor ┘        │
//!                                             └──► StartTrigger ◄─┘ (manual start)
//!                                                      └─ LifecycleGuard
//! ```
//!
//! - The fetcher and the channel both write into the [`SessionStore`]; the last
//!   write to complete wins.
//! - The [`ActionDispatcher`] turns intents into commands once the local
//!   player identity is known and drops them silently before.
//! - Manual and automatic starts go through the same [`StartTrigger`], whose
//!   [`LifecycleGuard`] lets exactly one request out per session.
//!
//! Service access sits behind [`GameApi`] and [`Connector`]; concrete HTTP
//! and WebSocket implementations live in their own crates. The `mock` feature
//! exposes in-memory implementations for tests.
pub mod api;
pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod guard;
pub mod monitor;
pub mod session;
pub mod store;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use api::GameApi;
pub use channel::{Channel, ChannelHandle, CommandSink, PresenceEvent};
pub use config::SessionConfig;
pub use dispatcher::{ActionDispatcher, Dispatch, IdentityCell, Intent, Suppression};
pub use error::{ClientError, ErrorKind, Result};
pub use fetcher::SnapshotFetcher;
pub use guard::{LifecycleGuard, StartOrigin, StartOutcome, StartPhase, StartTicket, StartTrigger};
pub use monitor::{AutoStartMonitor, should_auto_start};
pub use session::{BuildError, GameClient, GameSession, SessionBuilder};
pub use store::{SessionStore, SessionView};
pub use transport::{Connector, Transport};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockConnector, MockGameApi, MockServer, MockTransport};
