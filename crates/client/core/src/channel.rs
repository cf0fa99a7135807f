//! Real-time channel: one transport connection per session.
//!
//! [`Channel::open`] connects through a [`Connector`] and hands the transport
//! to a background [`ChannelWorker`]. The worker is the single consumer of
//! inbound frames: it decodes them in arrival order and writes recognized state
//! updates into the [`SessionStore`]. Outbound commands reach it through a
//! bounded queue exposed as [`CommandSink`].
use std::ops::ControlFlow;

use game_core::{Command, Inbound, SessionId, decode_inbound, encode_command};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::error::{ClientError, Result};
use crate::store::SessionStore;
use crate::transport::{Connector, Transport};

/// Connectivity notice pushed by the server.
#[derive(Clone, Debug, PartialEq)]
pub enum PresenceEvent {
    Connected(Value),
    Disconnected(Value),
}

/// Write end of a channel's outbound queue.
///
/// A detached sink (no channel open) accepts nothing.
#[derive(Clone, Debug, Default)]
pub struct CommandSink {
    tx: Option<mpsc::Sender<Command>>,
}

impl CommandSink {
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn is_attached(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Queues `command` for transmission. Returns `false` if nothing was queued.
    pub async fn submit(&self, command: Command) -> bool {
        let Some(tx) = &self.tx else {
            debug!(action = command.action(), "no channel open; command dropped");
            return false;
        };
        match tx.send(command).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(command)) => {
                debug!(action = command.action(), "channel closed; command dropped");
                false
            }
        }
    }
}

pub struct Channel;

impl Channel {
    /// Connects to the session endpoint and starts the worker.
    ///
    /// A connection failure is recorded in the store's error slot and returned.
    pub async fn open(
        connector: &dyn Connector,
        store: SessionStore,
        presence: broadcast::Sender<PresenceEvent>,
        command_buffer: usize,
    ) -> Result<ChannelHandle> {
        let session = store.session_id().clone();

        let transport = match connector.connect(&session).await {
            Ok(transport) => transport,
            Err(err) => {
                let err = into_channel_error(err);
                error!(%session, error = %err, "failed to open real-time channel");
                store.set_error(err.clone());
                return Err(err);
            }
        };
        info!(%session, "real-time channel open");

        let (command_tx, command_rx) = mpsc::channel(command_buffer.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = ChannelWorker {
            transport,
            store,
            presence,
            command_rx,
            shutdown_rx,
        };
        let task = tokio::spawn(worker.run());

        Ok(ChannelHandle {
            session,
            command_tx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// Owner's handle on an open channel. Dropping it stops the worker.
pub struct ChannelHandle {
    session: SessionId,
    command_tx: mpsc::Sender<Command>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub fn sink(&self) -> CommandSink {
        CommandSink {
            tx: Some(self.command_tx.clone()),
        }
    }

    /// Transmits `command` as-is.
    pub async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ClientError::Channel(format!("channel for {} is closed", self.session)))
    }

    /// True while the worker is still running.
    pub fn is_open(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the worker and closes the transport.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown_tx.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
        {
            warn!(session = %self.session, error = %err, "channel worker ended abnormally");
        }
        info!(session = %self.session, "real-time channel closed");
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown_tx.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Background task driving one transport.
struct ChannelWorker {
    transport: Box<dyn Transport>,
    store: SessionStore,
    presence: broadcast::Sender<PresenceEvent>,
    command_rx: mpsc::Receiver<Command>,
    shutdown_rx: oneshot::Receiver<()>,
}

impl ChannelWorker {
    async fn run(mut self) {
        loop {
            let flow = tokio::select! {
                _ = &mut self.shutdown_rx => ControlFlow::Break(true),
                command = self.command_rx.recv() => match command {
                    Some(command) => self.forward(command).await,
                    None => ControlFlow::Break(true),
                },
                frame = self.transport.recv() => self.handle_frame(frame),
            };

            if let ControlFlow::Break(close_transport) = flow {
                if close_transport && let Err(err) = self.transport.close().await {
                    debug!(session = %self.store.session_id(), error = %err, "transport close failed");
                }
                break;
            }
        }
    }

    async fn forward(&mut self, command: Command) -> ControlFlow<bool> {
        let frame = match encode_command(&command) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(action = command.action(), error = %err, "failed to encode command");
                return ControlFlow::Continue(());
            }
        };

        debug!(session = %self.store.session_id(), %frame, "sending command");
        match self.transport.send(frame).await {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                self.fail(into_channel_error(err));
                ControlFlow::Break(false)
            }
        }
    }

    fn handle_frame(&mut self, frame: Option<Result<String>>) -> ControlFlow<bool> {
        match frame {
            Some(Ok(text)) => {
                self.handle_text(&text);
                ControlFlow::Continue(())
            }
            Some(Err(err)) => {
                self.fail(into_channel_error(err));
                ControlFlow::Break(false)
            }
            None => {
                self.fail(ClientError::Channel("connection closed by server".into()));
                ControlFlow::Break(false)
            }
        }
    }

    fn handle_text(&self, text: &str) {
        let session = self.store.session_id();
        let inbound = match decode_inbound(text) {
            Ok(inbound) => inbound,
            Err(err) => {
                warn!(%session, error = %err, "dropping malformed message");
                return;
            }
        };
        trace!(%session, kind = inbound.kind(), "frame received");

        match inbound {
            Inbound::StateUpdate(snapshot) => {
                debug!(%session, players = snapshot.player_count(), "state update received");
                self.store.apply_snapshot(*snapshot);
            }
            Inbound::PlayerConnected(payload) => {
                info!(%session, %payload, "player connected");
                self.publish(PresenceEvent::Connected(payload));
            }
            Inbound::PlayerDisconnected(payload) => {
                info!(%session, %payload, "player disconnected");
                self.publish(PresenceEvent::Disconnected(payload));
            }
            Inbound::Unknown { kind } => {
                debug!(%session, %kind, "ignoring unrecognized message");
            }
        }
    }

    fn publish(&self, event: PresenceEvent) {
        // No subscribers is fine.
        let _ = self.presence.send(event);
    }

    fn fail(&self, err: ClientError) {
        error!(session = %self.store.session_id(), error = %err, "real-time channel failed");
        self.store.set_error(err);
    }
}

fn into_channel_error(err: ClientError) -> ClientError {
    match err {
        ClientError::Channel(_) => err,
        other => ClientError::Channel(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use game_core::{Card, MeldId, PlayerId};

    use super::*;
    use crate::mock::MockConnector;
    use crate::mock::fixtures::{state_update_frame, table};

    async fn open(connector: &MockConnector) -> (SessionStore, ChannelHandle, broadcast::Receiver<PresenceEvent>) {
        let store = SessionStore::new(SessionId::new("g1"));
        let (presence_tx, presence_rx) = broadcast::channel(8);
        let handle = Channel::open(connector, store.clone(), presence_tx, 8)
            .await
            .unwrap();
        (store, handle, presence_rx)
    }

    #[tokio::test]
    async fn connect_failure_is_recorded() {
        let connector = MockConnector::refusing(ClientError::Network("refused".into()));
        let store = SessionStore::new(SessionId::new("g1"));
        let (presence_tx, _) = broadcast::channel(8);

        let err = Channel::open(&connector, store.clone(), presence_tx, 8)
            .await
            .err()
            .unwrap();

        assert!(matches!(err, ClientError::Channel(_)));
        assert_eq!(store.last_error(), Some(err));
        assert!(store.current_snapshot().is_none());
    }

    #[tokio::test]
    async fn unknown_and_malformed_frames_leave_store_untouched() {
        let connector = MockConnector::new();
        let server = connector.server();
        let (store, handle, _presence) = open(&connector).await;

        server.push_text(r#"{"type":"chat","payload":{"text":"hi"}}"#);
        server.push_text(r#"{"type":"turn_timer"}"#);
        server.push_text("not json at all");
        server.push_text(&state_update_frame(&table("g1", 2, true, false)));

        let mut rx = store.subscribe();
        rx.wait_for(|view| view.is_connected()).await.unwrap();

        assert_eq!(store.current_snapshot().unwrap().player_count(), 2);
        assert!(store.last_error().is_none());
        handle.close().await;
    }

    #[tokio::test]
    async fn presence_is_broadcast() {
        let connector = MockConnector::new();
        let server = connector.server();
        let (store, handle, mut presence) = open(&connector).await;

        server.push_text(r#"{"type":"player_connected","payload":{"player_id":"p2"}}"#);
        server.push_text(r#"{"type":"player_disconnected","payload":{"player_id":"p2"}}"#);

        let first = presence.recv().await.unwrap();
        let second = presence.recv().await.unwrap();
        assert!(matches!(first, PresenceEvent::Connected(ref v) if v["player_id"] == "p2"));
        assert!(matches!(second, PresenceEvent::Disconnected(_)));
        assert!(store.current_snapshot().is_none());
        handle.close().await;
    }

    #[tokio::test]
    async fn commands_are_sent_in_order() {
        let connector = MockConnector::new();
        let server = connector.server();
        let (_store, handle, _presence) = open(&connector).await;
        let player = PlayerId::new("p1");

        handle
            .send(Command::DrawFromDeck { player_id: player.clone() })
            .await
            .unwrap();
        handle
            .send(Command::MeldCards {
                player_id: player,
                cards: vec![Card::new("7", "Hearts")],
                target_meld_id: Some(MeldId(3)),
            })
            .await
            .unwrap();

        let sent = server.wait_for_sent(2).await;
        assert!(sent[0].contains(r#""action":"draw_from_deck""#));
        assert!(sent[1].contains(r#""target_meld_id":3"#));
        handle.close().await;
    }

    #[tokio::test]
    async fn server_close_records_channel_failure() {
        let connector = MockConnector::new();
        let server = connector.server();
        let (store, handle, _presence) = open(&connector).await;

        server.hang_up();

        let mut rx = store.subscribe();
        let view = rx.wait_for(|view| view.last_error.is_some()).await.unwrap().clone();
        assert!(matches!(view.last_error, Some(ClientError::Channel(_))));

        tokio::time::timeout(Duration::from_secs(1), async {
            while handle.is_open() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(!handle.sink().submit(Command::PlayBotTurn).await);
    }

    async fn wait_closed(handle: &ChannelHandle) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while handle.is_open() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn transport_error_stops_the_worker() {
        let connector = MockConnector::new();
        let server = connector.server();
        let (store, handle, _presence) = open(&connector).await;

        server.push_text(&state_update_frame(&table("g1", 2, true, false)));
        server.push_error(ClientError::Network("connection reset".into()));
        server.push_text(&state_update_frame(&table("g1", 4, true, false)));

        let mut rx = store.subscribe();
        let view = rx.wait_for(|view| view.last_error.is_some()).await.unwrap().clone();
        assert!(matches!(
            view.last_error,
            Some(ClientError::Channel(ref msg)) if msg.contains("connection reset")
        ));

        wait_closed(&handle).await;
        assert_eq!(store.current_snapshot().unwrap().player_count(), 2);
        assert!(!server.client_closed());
    }

    #[tokio::test]
    async fn failed_send_stops_the_worker() {
        let connector = MockConnector::new();
        let server = connector.server();
        let (store, handle, _presence) = open(&connector).await;
        server.fail_sends(ClientError::Network("broken pipe".into()));

        handle.send(Command::PlayBotTurn).await.unwrap();

        let mut rx = store.subscribe();
        let view = rx.wait_for(|view| view.last_error.is_some()).await.unwrap().clone();
        assert!(matches!(
            view.last_error,
            Some(ClientError::Channel(ref msg)) if msg.contains("broken pipe")
        ));

        wait_closed(&handle).await;
        assert!(server.sent().is_empty());
        assert!(!handle.sink().submit(Command::PlayBotTurn).await);
    }

    #[tokio::test]
    async fn state_update_without_seat_ids_reaches_store() {
        let connector = MockConnector::new();
        let server = connector.server();
        let (store, handle, _presence) = open(&connector).await;

        server.push_text(
            r#"{"type":"game_state_update","payload":{
                "game_id":"g1",
                "players":[
                    {"name":"Bot 1","hand":[],"melds":[],"score":0},
                    {"name":"Bot 2","hand":[],"melds":[],"score":0}
                ],
                "deck":{"cards":[]},
                "discard_pile":[{"rank":"7","suit":"Diamonds"}],
                "pots":[[],[]],
                "current_turn_player_index":1,
                "game_started":true
            }}"#,
        );

        let mut rx = store.subscribe();
        rx.wait_for(|view| view.is_connected()).await.unwrap();

        let snapshot = store.current_snapshot().unwrap();
        assert_eq!(snapshot.current_player().unwrap().id, PlayerId::new("Bot 2"));
        assert!(store.last_error().is_none());
        handle.close().await;
    }

    #[tokio::test]
    async fn owner_close_is_not_an_error() {
        let connector = MockConnector::new();
        let server = connector.server();
        let (store, handle, _presence) = open(&connector).await;

        handle.close().await;

        assert!(server.client_closed());
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn detached_sink_accepts_nothing() {
        let sink = CommandSink::detached();
        assert!(!sink.is_attached());
        assert!(!sink.submit(Command::PlayBotTurn).await);
    }
}
