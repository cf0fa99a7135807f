//! Composition of the per-session components.
//!
//! [`GameClient`] owns the shared pieces (service API, connector, lifecycle
//! guard) and opens [`GameSession`]s. A session wires a store, a channel, a
//! bootstrap fetch and, optionally, the auto-start monitor together, and tears
//! them down as a unit.
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use game_core::{GameSetup, GameSnapshot, PlayerId, SessionId};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::api::GameApi;
use crate::channel::{Channel, ChannelHandle, CommandSink, PresenceEvent};
use crate::config::SessionConfig;
use crate::dispatcher::{ActionDispatcher, Dispatch, IdentityCell};
use crate::error::{ClientError, Result};
use crate::fetcher::SnapshotFetcher;
use crate::guard::{LifecycleGuard, StartOrigin, StartOutcome, StartTrigger};
use crate::monitor::AutoStartMonitor;
use crate::store::{SessionStore, SessionView};
use crate::transport::Connector;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Builder for [`GameClient`].
///
/// The API and connector are required. Without an explicit guard the client
/// gets a fresh one, so separate clients never share start state.
#[derive(Default)]
pub struct SessionBuilder {
    api: Option<Arc<dyn GameApi>>,
    connector: Option<Arc<dyn Connector>>,
    guard: Option<Arc<LifecycleGuard>>,
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api(mut self, api: Arc<dyn GameApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn guard(mut self, guard: Arc<LifecycleGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> std::result::Result<GameClient, BuildError> {
        Ok(GameClient {
            api: self.api.ok_or(BuildError::Missing("game api"))?,
            connector: self.connector.ok_or(BuildError::Missing("connector"))?,
            guard: self.guard.unwrap_or_default(),
            config: self.config,
            live: Arc::default(),
        })
    }
}

/// Entry point: creates games and opens sessions.
#[derive(Clone)]
pub struct GameClient {
    api: Arc<dyn GameApi>,
    connector: Arc<dyn Connector>,
    guard: Arc<LifecycleGuard>,
    config: SessionConfig,
    live: Arc<Mutex<HashSet<SessionId>>>,
}

impl GameClient {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn guard(&self) -> &Arc<LifecycleGuard> {
        &self.guard
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Validates `setup` locally, then asks the service for a new session.
    pub async fn create_game(&self, setup: &GameSetup) -> Result<SessionId> {
        setup.validate()?;
        let session = self.api.create_game(setup).await?;
        info!(%session, players = setup.total_players(), "game created");
        Ok(session)
    }

    /// True while a [`GameSession`] for `session` from this client (or a
    /// clone of it) is alive.
    pub fn is_open(&self, session: &SessionId) -> bool {
        lock_live(&self.live).contains(session)
    }

    /// Opens `session`: starts the bootstrap fetch, connects the channel and,
    /// when enabled, spawns the auto-start monitor.
    ///
    /// Only one session per id may be open at a time; a second call fails
    /// with [`ClientError::AlreadyOpen`] until the first is closed or dropped.
    /// A channel that fails to connect is not fatal; the failure is in the
    /// store's error slot and dispatch is suppressed until a new session is
    /// opened.
    pub async fn open(&self, session: SessionId) -> Result<GameSession> {
        let lease = LiveLease::acquire(&self.live, &session)?;
        info!(%session, "opening session");
        let store = SessionStore::new(session);
        let (presence, _) = broadcast::channel(self.config.presence_capacity.max(1));

        SnapshotFetcher::new(Arc::clone(&self.api), store.clone()).spawn();

        let channel = Channel::open(
            self.connector.as_ref(),
            store.clone(),
            presence.clone(),
            self.config.command_buffer,
        )
        .await
        .ok();

        let trigger = StartTrigger::new(Arc::clone(&self.api), Arc::clone(&self.guard), store.clone());
        let monitor = self
            .config
            .auto_start
            .then(|| AutoStartMonitor::spawn(trigger.clone(), store.subscribe()));

        Ok(GameSession {
            sink: channel.as_ref().map(ChannelHandle::sink).unwrap_or_default(),
            api: Arc::clone(&self.api),
            identity: IdentityCell::new(),
            store,
            trigger,
            channel,
            presence,
            monitor,
            _lease: lease,
        })
    }
}

fn lock_live(live: &Mutex<HashSet<SessionId>>) -> MutexGuard<'_, HashSet<SessionId>> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registration of one open session id; released on drop.
struct LiveLease {
    live: Arc<Mutex<HashSet<SessionId>>>,
    session: SessionId,
}

impl LiveLease {
    fn acquire(live: &Arc<Mutex<HashSet<SessionId>>>, session: &SessionId) -> Result<Self> {
        if !lock_live(live).insert(session.clone()) {
            warn!(%session, "session already open");
            return Err(ClientError::AlreadyOpen(session.clone()));
        }
        Ok(Self {
            live: Arc::clone(live),
            session: session.clone(),
        })
    }
}

impl Drop for LiveLease {
    fn drop(&mut self) {
        lock_live(&self.live).remove(&self.session);
    }
}

/// One open game session.
pub struct GameSession {
    api: Arc<dyn GameApi>,
    store: SessionStore,
    identity: IdentityCell,
    trigger: StartTrigger,
    channel: Option<ChannelHandle>,
    sink: CommandSink,
    presence: broadcast::Sender<PresenceEvent>,
    monitor: Option<AutoStartMonitor>,
    _lease: LiveLease,
}

impl GameSession {
    pub fn session_id(&self) -> &SessionId {
        self.store.session_id()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn current_snapshot(&self) -> Option<Arc<GameSnapshot>> {
        self.store.current_snapshot()
    }

    pub fn last_error(&self) -> Option<ClientError> {
        self.store.last_error()
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.store.subscribe()
    }

    /// Player connect/disconnect notices from the channel.
    pub fn presence(&self) -> broadcast::Receiver<PresenceEvent> {
        self.presence.subscribe()
    }

    pub fn channel_open(&self) -> bool {
        self.channel.as_ref().is_some_and(ChannelHandle::is_open)
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.identity.get().cloned()
    }

    pub fn dispatcher(&self) -> ActionDispatcher {
        ActionDispatcher::new(self.identity.clone(), self.sink.clone())
    }

    /// Joins the game as `player_name` and resolves the local identity.
    pub async fn join(&self, player_name: &str) -> Result<PlayerId> {
        let session = self.store.session_id();
        match self.api.join_game(session, player_name).await {
            Ok(record) => {
                info!(%session, player = %record.id, name = %record.name, "joined game");
                Ok(self.identity.resolve(record.id).clone())
            }
            Err(err) => {
                warn!(%session, error = %err, "join failed");
                self.store.set_error(err.clone());
                Err(err)
            }
        }
    }

    /// Manual start. Shares its guard with the auto-start monitor.
    pub async fn start_game(&self) -> StartOutcome {
        self.trigger.start(StartOrigin::Manual).await
    }

    pub async fn play_bot_turn(&self) -> Dispatch {
        self.dispatcher().play_bot_turn().await
    }

    /// Stops the monitor, closes the channel and marks the store closed.
    /// An in-flight bootstrap fetch keeps running but its result is discarded.
    pub async fn close(mut self) {
        self.monitor.take();
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        self.store.close();
        info!(session = %self.store.session_id(), "session closed");
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.store.close();
    }
}
