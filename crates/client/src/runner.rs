//! Headless session runner.
//!
//! Creates or opens a game, optionally joins it, and logs every snapshot and
//! presence notice until shutdown is requested or the channel fails.
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use client_bootstrap::ClientSetup;
use client_core::{ClientError, ErrorKind, GameSession, PresenceEvent};
use game_core::{GameSnapshot, SessionId};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown future resolved.
    Interrupted,
    ChannelFailed(ClientError),
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub session: SessionId,
    /// Distinct snapshots observed (coalesced updates count once).
    pub snapshots: usize,
    pub stop: StopReason,
}

pub async fn run<F>(setup: ClientSetup, shutdown: F) -> Result<RunReport>
where
    F: Future<Output = ()>,
{
    let ClientSetup { config, client } = setup;

    let session_id = match config.game_id.clone() {
        Some(id) => id,
        None => {
            let game_setup = config.game_setup();
            info!(
                humans = game_setup.human_players,
                bots = game_setup.bot_players.len(),
                "no game configured; creating one"
            );
            client
                .create_game(&game_setup)
                .await
                .context("Failed to create game")?
        }
    };

    let session = client
        .open(session_id.clone())
        .await
        .context("Failed to open session")?;

    if let Some(name) = &config.player_name {
        match session.join(name).await {
            Ok(player) => info!(%player, "playing as {name}"),
            Err(err) => warn!(error = %err, "join failed; continuing as observer"),
        }
    }

    let (stop, snapshots) = watch(&session, shutdown).await;
    match &stop {
        StopReason::Interrupted => info!(session = %session_id, "shutdown requested"),
        StopReason::ChannelFailed(err) => warn!(session = %session_id, error = %err, "stopping"),
    }
    session.close().await;

    Ok(RunReport {
        session: session_id,
        snapshots,
        stop,
    })
}

async fn watch<F>(session: &GameSession, shutdown: F) -> (StopReason, usize)
where
    F: Future<Output = ()>,
{
    let mut view = session.subscribe();
    let mut presence = session.presence();
    let mut presence_open = true;
    let mut last_snapshot: Option<Arc<GameSnapshot>> = None;
    let mut last_error: Option<ClientError> = None;
    let mut snapshots = 0;
    tokio::pin!(shutdown);

    loop {
        let current = view.borrow_and_update().clone();

        if let Some(snapshot) = &current.snapshot
            && !last_snapshot
                .as_ref()
                .is_some_and(|seen| Arc::ptr_eq(seen, snapshot))
        {
            snapshots += 1;
            info!("{}", snapshot.summary());
            last_snapshot = Some(Arc::clone(snapshot));
        }

        if current.last_error != last_error {
            if let Some(err) = &current.last_error {
                warn!(error = %err, "session error");
                if err.kind() == ErrorKind::Channel {
                    return (StopReason::ChannelFailed(err.clone()), snapshots);
                }
            }
            last_error = current.last_error;
        }

        tokio::select! {
            _ = &mut shutdown => return (StopReason::Interrupted, snapshots),
            changed = view.changed() => {
                if changed.is_err() {
                    return (StopReason::Interrupted, snapshots);
                }
            }
            notice = presence.recv(), if presence_open => match notice {
                Ok(PresenceEvent::Connected(payload)) => info!(%payload, "player connected"),
                Ok(PresenceEvent::Disconnected(payload)) => info!(%payload, "player disconnected"),
                Err(RecvError::Lagged(missed)) => warn!(missed, "presence notices dropped"),
                Err(RecvError::Closed) => presence_open = false,
            },
        }
    }
}
