//! At-most-once guard for the "start game" transition.
//!
//! Each session moves through `Idle -> Requested -> InFlight -> Completed`.
//! A failed request falls back to `Idle` so it can be retried; `Completed` is
//! terminal. Checking and marking happen inside one critical section, before
//! the request is awaited, so concurrent triggers cannot both pass.
//!
//! [`StartTrigger`] is the single entry point used by both the manual start and
//! the [`AutoStartMonitor`](crate::AutoStartMonitor).
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use game_core::SessionId;
use tracing::{debug, info, warn};

use crate::api::GameApi;
use crate::error::ClientError;
use crate::store::SessionStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartPhase {
    #[default]
    Idle,
    /// Claimed by a trigger; the request has not been issued yet.
    Requested,
    /// Request issued, awaiting the server.
    InFlight,
    Completed,
}

impl StartPhase {
    /// Projection: a start has been claimed or has succeeded.
    pub fn is_start_requested(self) -> bool {
        !matches!(self, StartPhase::Idle)
    }

    /// Projection: a start is claimed but not yet resolved.
    pub fn is_in_flight(self) -> bool {
        matches!(self, StartPhase::Requested | StartPhase::InFlight)
    }
}

/// Per-session start phases.
#[derive(Debug, Default)]
pub struct LifecycleGuard {
    phases: Mutex<HashMap<SessionId, StartPhase>>,
}

impl LifecycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, session: &SessionId) -> StartPhase {
        self.lock().get(session).copied().unwrap_or_default()
    }

    pub fn is_start_requested(&self, session: &SessionId) -> bool {
        self.phase(session).is_start_requested()
    }

    pub fn is_in_flight(&self, session: &SessionId) -> bool {
        self.phase(session).is_in_flight()
    }

    /// Claims the start for `session` if it is idle.
    ///
    /// On success the session is `Requested` and the returned ticket must be
    /// settled; on refusal the current phase is returned.
    pub fn try_begin(self: &Arc<Self>, session: &SessionId) -> Result<StartTicket, StartPhase> {
        let mut phases = self.lock();
        let phase = phases.get(session).copied().unwrap_or_default();
        if phase != StartPhase::Idle {
            return Err(phase);
        }
        phases.insert(session.clone(), StartPhase::Requested);

        Ok(StartTicket {
            guard: Arc::clone(self),
            session: session.clone(),
            settled: false,
        })
    }

    fn set(&self, session: &SessionId, phase: StartPhase) {
        let mut phases = self.lock();
        if phase == StartPhase::Idle {
            phases.remove(session);
        } else {
            phases.insert(session.clone(), phase);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, StartPhase>> {
        self.phases.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive right to issue one start request.
///
/// Dropping an unsettled ticket (for example when the owning future is
/// cancelled mid-request) counts as a failure and returns the session to
/// `Idle`.
#[must_use]
pub struct StartTicket {
    guard: Arc<LifecycleGuard>,
    session: SessionId,
    settled: bool,
}

impl StartTicket {
    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    /// `Requested -> InFlight`, right before the request goes out.
    pub fn launch(&self) {
        self.guard.set(&self.session, StartPhase::InFlight);
    }

    pub fn complete(mut self) {
        self.settled = true;
        self.guard.set(&self.session, StartPhase::Completed);
    }

    pub fn fail(mut self) {
        self.settled = true;
        self.guard.set(&self.session, StartPhase::Idle);
    }
}

impl Drop for StartTicket {
    fn drop(&mut self) {
        if !self.settled {
            warn!(session = %self.session, "start abandoned before completion; releasing guard");
            self.guard.set(&self.session, StartPhase::Idle);
        }
    }
}

/// Who asked for the start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOrigin {
    Manual,
    Automatic,
}

impl fmt::Display for StartOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartOrigin::Manual => f.write_str("manual"),
            StartOrigin::Automatic => f.write_str("automatic"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// This call issued the request and it succeeded.
    Started,
    /// An earlier call already succeeded.
    AlreadyStarted,
    /// Another call holds the start right now.
    InProgress,
    /// This call issued the request and it failed; the guard is idle again.
    Failed(ClientError),
}

/// The start entry point shared by manual and automatic triggers.
#[derive(Clone)]
pub struct StartTrigger {
    api: Arc<dyn GameApi>,
    guard: Arc<LifecycleGuard>,
    store: SessionStore,
}

impl StartTrigger {
    pub fn new(api: Arc<dyn GameApi>, guard: Arc<LifecycleGuard>, store: SessionStore) -> Self {
        Self { api, guard, store }
    }

    pub fn session_id(&self) -> &SessionId {
        self.store.session_id()
    }

    pub fn guard(&self) -> &Arc<LifecycleGuard> {
        &self.guard
    }

    pub async fn start(&self, origin: StartOrigin) -> StartOutcome {
        let session = self.store.session_id();

        let ticket = match self.guard.try_begin(session) {
            Ok(ticket) => ticket,
            Err(phase) => {
                debug!(%session, %origin, ?phase, "start already claimed");
                return if phase == StartPhase::Completed {
                    StartOutcome::AlreadyStarted
                } else {
                    StartOutcome::InProgress
                };
            }
        };

        info!(%session, %origin, "requesting game start");
        ticket.launch();
        match self.api.start_game(session).await {
            Ok(()) => {
                ticket.complete();
                info!(%session, "game start accepted");
                StartOutcome::Started
            }
            Err(err) => {
                ticket.fail();
                warn!(%session, error = %err, "game start failed");
                self.store.set_error(err.clone());
                StartOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::future::join_all;

    use super::*;
    use crate::mock::MockGameApi;

    fn trigger(api: &Arc<MockGameApi>, guard: &Arc<LifecycleGuard>, id: &str) -> StartTrigger {
        StartTrigger::new(
            api.clone(),
            guard.clone(),
            SessionStore::new(SessionId::new(id)),
        )
    }

    #[test]
    fn projections_follow_phase() {
        assert!(!StartPhase::Idle.is_start_requested());
        assert!(StartPhase::Requested.is_start_requested() && StartPhase::Requested.is_in_flight());
        assert!(StartPhase::InFlight.is_in_flight());
        assert!(StartPhase::Completed.is_start_requested());
        assert!(!StartPhase::Completed.is_in_flight());
    }

    #[test]
    fn second_claim_is_refused() {
        let guard = Arc::new(LifecycleGuard::new());
        let session = SessionId::new("g1");

        let ticket = guard.try_begin(&session).ok().unwrap();
        assert_eq!(guard.try_begin(&session).err(), Some(StartPhase::Requested));

        ticket.launch();
        assert_eq!(guard.try_begin(&session).err(), Some(StartPhase::InFlight));

        ticket.complete();
        assert_eq!(guard.try_begin(&session).err(), Some(StartPhase::Completed));
    }

    #[test]
    fn dropped_ticket_releases_session() {
        let guard = Arc::new(LifecycleGuard::new());
        let session = SessionId::new("g1");

        drop(guard.try_begin(&session).ok().unwrap());

        assert_eq!(guard.phase(&session), StartPhase::Idle);
        assert!(guard.try_begin(&session).is_ok());
    }

    #[test]
    fn sessions_are_independent() {
        let guard = Arc::new(LifecycleGuard::new());
        let a = guard.try_begin(&SessionId::new("a")).ok().unwrap();
        assert!(guard.try_begin(&SessionId::new("b")).is_ok());
        a.complete();
    }

    #[tokio::test]
    async fn concurrent_starts_issue_one_request() {
        for n in [1usize, 2, 8, 32] {
            let api = Arc::new(MockGameApi::new());
            let release = api.hold_start();
            let guard = Arc::new(LifecycleGuard::new());
            let trigger = trigger(&api, &guard, "g1");

            let calls = (0..n).map(|i| {
                let trigger = trigger.clone();
                let origin = if i % 2 == 0 {
                    StartOrigin::Manual
                } else {
                    StartOrigin::Automatic
                };
                tokio::spawn(async move { trigger.start(origin).await })
            });
            let handles: Vec<_> = calls.collect();

            api.wait_for_start_calls(1).await;
            let _ = release.send(());
            let outcomes: Vec<_> = join_all(handles)
                .await
                .into_iter()
                .map(|r| r.unwrap())
                .collect();

            assert_eq!(api.start_calls(), 1, "n = {n}");
            assert_eq!(
                outcomes.iter().filter(|o| **o == StartOutcome::Started).count(),
                1
            );
            assert!(
                outcomes
                    .iter()
                    .all(|o| matches!(o, StartOutcome::Started | StartOutcome::InProgress | StartOutcome::AlreadyStarted))
            );
        }
    }

    #[tokio::test]
    async fn failure_allows_retry() {
        let api = Arc::new(MockGameApi::new());
        api.push_start(Err(ClientError::Rejected {
            status: 400,
            body: "not enough players".into(),
        }));
        let guard = Arc::new(LifecycleGuard::new());
        let trigger = trigger(&api, &guard, "g1");

        let first = trigger.start(StartOrigin::Manual).await;
        assert!(matches!(first, StartOutcome::Failed(ClientError::Rejected { status: 400, .. })));
        assert!(!guard.is_start_requested(trigger.session_id()));
        assert!(!guard.is_in_flight(trigger.session_id()));

        assert_eq!(trigger.start(StartOrigin::Manual).await, StartOutcome::Started);
        assert_eq!(api.start_calls(), 2);
    }

    #[tokio::test]
    async fn failure_is_recorded_in_store() {
        let api = Arc::new(MockGameApi::new());
        api.push_start(Err(ClientError::Network("timeout".into())));
        let guard = Arc::new(LifecycleGuard::new());
        let store = SessionStore::new(SessionId::new("g1"));
        let trigger = StartTrigger::new(api, guard, store.clone());

        trigger.start(StartOrigin::Automatic).await;

        assert_eq!(store.last_error(), Some(ClientError::Network("timeout".into())));
    }

    #[tokio::test]
    async fn success_is_terminal() {
        let api = Arc::new(MockGameApi::new());
        let guard = Arc::new(LifecycleGuard::new());
        let trigger = trigger(&api, &guard, "g1");

        assert_eq!(trigger.start(StartOrigin::Manual).await, StartOutcome::Started);
        for _ in 0..3 {
            assert_eq!(
                trigger.start(StartOrigin::Automatic).await,
                StartOutcome::AlreadyStarted
            );
        }
        assert_eq!(api.start_calls(), 1);
        assert!(guard.is_start_requested(trigger.session_id()));
        assert!(!guard.is_in_flight(trigger.session_id()));
    }

    #[tokio::test]
    async fn cancelled_start_can_be_retried() {
        let api = Arc::new(MockGameApi::new());
        let _release = api.hold_start();
        let guard = Arc::new(LifecycleGuard::new());
        let trigger = trigger(&api, &guard, "g1");

        let pending = tokio::spawn({
            let trigger = trigger.clone();
            async move { trigger.start(StartOrigin::Manual).await }
        });
        api.wait_for_start_calls(1).await;
        assert!(guard.is_in_flight(trigger.session_id()));

        pending.abort();
        let _ = pending.await;

        assert_eq!(guard.phase(trigger.session_id()), StartPhase::Idle);
    }
}
