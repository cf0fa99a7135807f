//! In-memory game service and real-time server for tests.
//!
//! [`MockGameApi`] answers from scripted queues and counts calls.
//! [`MockConnector`] hands out a single [`MockTransport`] wired to a
//! [`MockServer`] the test drives.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use game_core::{GameSetup, GameSnapshot, PlayerId, PlayerRecord, SessionId};
use tokio::sync::{Notify, mpsc, oneshot};

use crate::api::GameApi;
use crate::error::{ClientError, Result};
use crate::transport::{Connector, Transport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct ApiState {
    snapshots: VecDeque<Result<GameSnapshot>>,
    joins: VecDeque<Result<PlayerRecord>>,
    starts: VecDeque<Result<()>>,
    creates: VecDeque<Result<SessionId>>,
    fetch_gate: Option<oneshot::Receiver<()>>,
    start_gate: Option<oneshot::Receiver<()>>,
    fetch_calls: usize,
    start_calls: usize,
    joined: Vec<String>,
    created: Vec<GameSetup>,
}

/// Scripted [`GameApi`].
///
/// With an empty queue: fetch fails with `NotFound`, join succeeds with id
/// `"{name}-id"`, start succeeds, create returns `mock-game-{n}`.
#[derive(Clone, Default)]
pub struct MockGameApi {
    state: Arc<Mutex<ApiState>>,
    calls: Arc<Notify>,
}

impl MockGameApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_snapshot(&self, result: Result<GameSnapshot>) {
        lock(&self.state).snapshots.push_back(result);
    }

    pub fn push_join(&self, result: Result<PlayerRecord>) {
        lock(&self.state).joins.push_back(result);
    }

    pub fn push_start(&self, result: Result<()>) {
        lock(&self.state).starts.push_back(result);
    }

    pub fn push_create(&self, result: Result<SessionId>) {
        lock(&self.state).creates.push_back(result);
    }

    /// Holds the next fetch until the returned sender fires or is dropped.
    pub fn hold_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.state).fetch_gate = Some(rx);
        tx
    }

    /// Holds the next start until the returned sender fires or is dropped.
    pub fn hold_start(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.state).start_gate = Some(rx);
        tx
    }

    pub fn fetch_calls(&self) -> usize {
        lock(&self.state).fetch_calls
    }

    pub fn start_calls(&self) -> usize {
        lock(&self.state).start_calls
    }

    pub fn joined_names(&self) -> Vec<String> {
        lock(&self.state).joined.clone()
    }

    pub fn created_setups(&self) -> Vec<GameSetup> {
        lock(&self.state).created.clone()
    }

    pub async fn wait_for_fetch_calls(&self, n: usize) {
        self.wait_until(|state| state.fetch_calls >= n).await;
    }

    pub async fn wait_for_start_calls(&self, n: usize) {
        self.wait_until(|state| state.start_calls >= n).await;
    }

    async fn wait_until(&self, done: impl Fn(&ApiState) -> bool) {
        loop {
            let notified = self.calls.notified();
            if done(&lock(&self.state)) {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl GameApi for MockGameApi {
    async fn fetch_snapshot(&self, session: &SessionId) -> Result<GameSnapshot> {
        let (gate, result) = {
            let mut state = lock(&self.state);
            state.fetch_calls += 1;
            (state.fetch_gate.take(), state.snapshots.pop_front())
        };
        self.calls.notify_waiters();

        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result.unwrap_or_else(|| Err(ClientError::NotFound(session.clone())))
    }

    async fn join_game(&self, _session: &SessionId, player_name: &str) -> Result<PlayerRecord> {
        let result = {
            let mut state = lock(&self.state);
            state.joined.push(player_name.to_string());
            state.joins.pop_front()
        };
        self.calls.notify_waiters();

        result.unwrap_or_else(|| {
            Ok(PlayerRecord {
                id: PlayerId::new(format!("{player_name}-id")),
                name: player_name.to_string(),
            })
        })
    }

    async fn start_game(&self, _session: &SessionId) -> Result<()> {
        let (gate, result) = {
            let mut state = lock(&self.state);
            state.start_calls += 1;
            (state.start_gate.take(), state.starts.pop_front())
        };
        self.calls.notify_waiters();

        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result.unwrap_or(Ok(()))
    }

    async fn create_game(&self, setup: &GameSetup) -> Result<SessionId> {
        setup.validate()?;
        let (n, result) = {
            let mut state = lock(&self.state);
            state.created.push(setup.clone());
            (state.created.len(), state.creates.pop_front())
        };
        self.calls.notify_waiters();

        result.unwrap_or_else(|| Ok(SessionId::new(format!("mock-game-{n}"))))
    }
}

enum ServerFrame {
    Text(String),
    Error(ClientError),
    HangUp,
}

struct ServerState {
    incoming: Option<mpsc::UnboundedReceiver<ServerFrame>>,
    sent: Vec<String>,
    client_closed: bool,
    connected: Option<SessionId>,
    send_error: Option<ClientError>,
}

/// Test-side end of the mock connection.
#[derive(Clone)]
pub struct MockServer {
    frames: mpsc::UnboundedSender<ServerFrame>,
    state: Arc<Mutex<ServerState>>,
    sent_notify: Arc<Notify>,
}

impl MockServer {
    fn new() -> Self {
        let (frames, incoming) = mpsc::unbounded_channel();
        Self {
            frames,
            state: Arc::new(Mutex::new(ServerState {
                incoming: Some(incoming),
                sent: Vec::new(),
                client_closed: false,
                connected: None,
                send_error: None,
            })),
            sent_notify: Arc::new(Notify::new()),
        }
    }

    /// Queues an inbound text frame. Frames pushed before connect are buffered.
    pub fn push_text(&self, frame: &str) {
        let _ = self.frames.send(ServerFrame::Text(frame.to_string()));
    }

    pub fn push_error(&self, error: ClientError) {
        let _ = self.frames.send(ServerFrame::Error(error));
    }

    /// Makes every later client send fail with `error`.
    pub fn fail_sends(&self, error: ClientError) {
        lock(&self.state).send_error = Some(error);
    }

    /// Closes the connection from the server side.
    pub fn hang_up(&self) {
        let _ = self.frames.send(ServerFrame::HangUp);
    }

    /// Frames the client has sent so far.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    pub async fn wait_for_sent(&self, n: usize) -> Vec<String> {
        loop {
            let notified = self.sent_notify.notified();
            let sent = self.sent();
            if sent.len() >= n {
                return sent;
            }
            notified.await;
        }
    }

    /// True once the client closed its transport.
    pub fn client_closed(&self) -> bool {
        lock(&self.state).client_closed
    }

    pub fn connected_session(&self) -> Option<SessionId> {
        lock(&self.state).connected.clone()
    }
}

/// [`Connector`] backed by one [`MockServer`].
#[derive(Clone)]
pub struct MockConnector {
    server: MockServer,
    refuse: Option<ClientError>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            server: MockServer::new(),
            refuse: None,
        }
    }

    /// A connector whose every connect attempt fails with `error`.
    pub fn refusing(error: ClientError) -> Self {
        Self {
            server: MockServer::new(),
            refuse: Some(error),
        }
    }

    pub fn server(&self) -> MockServer {
        self.server.clone()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, session: &SessionId) -> Result<Box<dyn Transport>> {
        if let Some(error) = &self.refuse {
            return Err(error.clone());
        }

        let incoming = {
            let mut state = lock(&self.server.state);
            state.connected = Some(session.clone());
            state.incoming.take()
        };
        let incoming = incoming
            .ok_or_else(|| ClientError::Channel("mock server already has a connection".into()))?;

        Ok(Box::new(MockTransport {
            incoming,
            server: self.server.clone(),
            open: true,
        }))
    }
}

/// Client end of the mock connection.
pub struct MockTransport {
    incoming: mpsc::UnboundedReceiver<ServerFrame>,
    server: MockServer,
    open: bool,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, frame: String) -> Result<()> {
        if !self.open {
            return Err(ClientError::Channel("mock connection closed".into()));
        }
        let mut state = lock(&self.server.state);
        if let Some(error) = state.send_error.clone() {
            return Err(error);
        }
        state.sent.push(frame);
        drop(state);
        self.server.sent_notify.notify_waiters();
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        if !self.open {
            return None;
        }
        match self.incoming.recv().await {
            Some(ServerFrame::Text(text)) => Some(Ok(text)),
            Some(ServerFrame::Error(error)) => Some(Err(error)),
            Some(ServerFrame::HangUp) | None => {
                self.open = false;
                None
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        lock(&self.server.state).client_closed = true;
        Ok(())
    }
}

/// Snapshot and frame builders shared by tests.
pub mod fixtures {
    use game_core::{Card, Deck, GameSnapshot, PlayerId, PlayerView, SessionId};

    pub fn player(name: &str, is_bot: bool) -> PlayerView {
        PlayerView {
            id: PlayerId::new(format!("{name}-id")),
            name: name.to_string(),
            hand: Vec::new(),
            melds: Vec::new(),
            score: 0,
            is_bot,
        }
    }

    /// A table of `players` seats, all bots or all humans.
    pub fn table(game: &str, players: usize, bots: bool, started: bool) -> GameSnapshot {
        let seats = (1..=players)
            .map(|i| {
                if bots {
                    player(&format!("Bot {i}"), true)
                } else {
                    player(&format!("Player {i}"), false)
                }
            })
            .collect();

        GameSnapshot {
            game_id: SessionId::new(game),
            players: seats,
            deck: Deck::default(),
            discard_pile: Vec::new(),
            pots: Vec::new(),
            current_turn_player_index: 0,
            game_started: started,
        }
    }

    /// A started two-player table with the given discard pile, oldest first.
    pub fn snapshot_with_discard(game: &str, pile: &[(&str, &str)]) -> GameSnapshot {
        let mut snapshot = table(game, 2, false, true);
        snapshot.discard_pile = pile
            .iter()
            .map(|(rank, suit)| Card::new(*rank, *suit))
            .collect();
        snapshot
    }

    /// Wraps `snapshot` in a `game_state_update` envelope.
    pub fn state_update_frame(snapshot: &GameSnapshot) -> String {
        serde_json::json!({ "type": "game_state_update", "payload": snapshot }).to_string()
    }
}
