//! Automatic start for sessions seated entirely by bots.
use game_core::GameSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::guard::{StartOrigin, StartTrigger};
use crate::store::SessionView;

/// Minimum seats for an automatic start.
pub const MIN_AUTO_START_PLAYERS: usize = 2;

/// Join criteria for an all-automated session.
pub fn should_auto_start(snapshot: &GameSnapshot) -> bool {
    let count = snapshot.player_count();
    !snapshot.game_started
        && count >= MIN_AUTO_START_PLAYERS
        && count > 0
        && snapshot.all_players_automated()
}

/// The parts of the view whose changes trigger a re-evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Observed {
    available: bool,
    players: usize,
    started: bool,
}

impl Observed {
    fn of(view: &SessionView) -> Self {
        match &view.snapshot {
            Some(snapshot) => Self {
                available: true,
                players: snapshot.player_count(),
                started: snapshot.game_started,
            },
            None => Self {
                available: false,
                players: 0,
                started: false,
            },
        }
    }
}

/// Background task watching the store. Aborted on drop.
pub struct AutoStartMonitor {
    task: JoinHandle<()>,
}

impl AutoStartMonitor {
    pub fn spawn(trigger: StartTrigger, view: watch::Receiver<SessionView>) -> Self {
        Self {
            task: tokio::spawn(run(trigger, view)),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        // Drop aborts.
    }
}

impl Drop for AutoStartMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(trigger: StartTrigger, mut view: watch::Receiver<SessionView>) {
    let session = trigger.session_id().clone();
    let mut last: Option<Observed> = None;

    loop {
        let (observed, qualifies) = {
            let current = view.borrow_and_update();
            let qualifies = current.snapshot.as_deref().is_some_and(should_auto_start);
            (Observed::of(&current), qualifies)
        };

        if last != Some(observed) {
            last = Some(observed);
            if qualifies && !trigger.guard().is_start_requested(&session) {
                info!(%session, players = observed.players, "all seats automated; starting game");
                let outcome = trigger.start(StartOrigin::Automatic).await;
                debug!(%session, ?outcome, "automatic start settled");
            }
        }

        if view.changed().await.is_err() {
            debug!(%session, "store dropped; auto-start monitor exiting");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use game_core::SessionId;

    use super::*;
    use crate::error::ClientError;
    use crate::guard::LifecycleGuard;
    use crate::mock::MockGameApi;
    use crate::mock::fixtures::{player, table};
    use crate::store::SessionStore;

    #[test]
    fn predicate() {
        assert!(should_auto_start(&table("g", 4, true, false)));
        assert!(should_auto_start(&table("g", 2, true, false)));
        assert!(!should_auto_start(&table("g", 1, true, false)));
        assert!(!should_auto_start(&table("g", 0, true, false)));
        assert!(!should_auto_start(&table("g", 4, true, true)));
        assert!(!should_auto_start(&table("g", 4, false, false)));

        let mut mixed = table("g", 3, true, false);
        mixed.players.push(player("Ana", false));
        assert!(!should_auto_start(&mixed));
    }

    fn setup() -> (Arc<MockGameApi>, Arc<LifecycleGuard>, SessionStore, AutoStartMonitor) {
        let api = Arc::new(MockGameApi::new());
        let guard = Arc::new(LifecycleGuard::new());
        let store = SessionStore::new(SessionId::new("g1"));
        let trigger = StartTrigger::new(api.clone(), guard.clone(), store.clone());
        let monitor = AutoStartMonitor::spawn(trigger, store.subscribe());
        (api, guard, store, monitor)
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn fires_once_for_bot_table() {
        let (api, guard, store, _monitor) = setup();

        store.apply_snapshot(table("g1", 4, true, false));
        api.wait_for_start_calls(1).await;

        // Same shape again, then the started flag arrives.
        store.apply_snapshot(table("g1", 4, true, false));
        store.apply_snapshot(table("g1", 4, true, true));
        settle().await;

        assert_eq!(api.start_calls(), 1);
        assert!(guard.is_start_requested(&SessionId::new("g1")));
    }

    #[tokio::test]
    async fn ignores_tables_with_humans() {
        let (api, _guard, store, _monitor) = setup();

        let mut snapshot = table("g1", 1, true, false);
        snapshot.players.push(player("Ana", false));
        store.apply_snapshot(snapshot);
        settle().await;

        assert_eq!(api.start_calls(), 0);
    }

    #[tokio::test]
    async fn retries_on_next_transition_after_failure() {
        let (api, guard, store, _monitor) = setup();
        api.push_start(Err(ClientError::Network("timeout".into())));

        store.apply_snapshot(table("g1", 2, true, false));
        api.wait_for_start_calls(1).await;
        settle().await;
        assert!(!guard.is_start_requested(&SessionId::new("g1")));

        // A bot joins: player count changes, predicate still holds.
        store.apply_snapshot(table("g1", 3, true, false));
        tokio::time::timeout(Duration::from_secs(1), api.wait_for_start_calls(2))
            .await
            .unwrap();
        assert!(guard.is_start_requested(&SessionId::new("g1")));
    }

    #[tokio::test]
    async fn manual_start_suppresses_automatic_one() {
        let (api, guard, store, _monitor) = setup();
        let manual = StartTrigger::new(api.clone(), guard.clone(), store.clone());

        manual.start(StartOrigin::Manual).await;
        store.apply_snapshot(table("g1", 4, true, false));
        settle().await;

        assert_eq!(api.start_calls(), 1);
    }

    #[tokio::test]
    async fn stops_on_drop() {
        let (_api, _guard, _store, monitor) = setup();
        assert!(monitor.is_running());
        monitor.stop();
    }
}
