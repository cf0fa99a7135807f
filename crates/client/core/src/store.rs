//! Reactive container for the latest known session state.
//!
//! The store is backed by a [`watch`] channel: readers always observe the most
//! recent value and never an intermediate one. The snapshot is replaced
//! wholesale on every write (last completion wins, see [`SessionStore::apply_snapshot`]).
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use game_core::{GameSnapshot, SessionId};
use tokio::sync::watch;

use crate::error::ClientError;

/// What readers of the store see.
#[derive(Clone, Debug, Default)]
pub struct SessionView {
    /// `None` until the first snapshot arrives; never reverts to `None` after.
    pub snapshot: Option<Arc<GameSnapshot>>,
    /// Most recent failure. Independent of the snapshot and never auto-cleared.
    pub last_error: Option<ClientError>,
}

impl SessionView {
    /// A present snapshot means the session counts as connected.
    pub fn is_connected(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Cloneable handle to one session's state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    session: SessionId,
    view: watch::Sender<SessionView>,
    closed: AtomicBool,
}

impl SessionStore {
    pub fn new(session: SessionId) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        Self {
            inner: Arc::new(StoreInner {
                session,
                view,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.session
    }

    pub fn current_snapshot(&self) -> Option<Arc<GameSnapshot>> {
        self.inner.view.borrow().snapshot.clone()
    }

    pub fn last_error(&self) -> Option<ClientError> {
        self.inner.view.borrow().last_error.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.view.borrow().is_connected()
    }

    pub fn view(&self) -> SessionView {
        self.inner.view.borrow().clone()
    }

    /// Receiver that wakes on every store write.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.inner.view.subscribe()
    }

    /// Replaces the snapshot with `snapshot`.
    ///
    /// There is no ordering between the bootstrap fetch and stream updates:
    /// whichever write completes last is what readers see. Returns `false`
    /// when the write was discarded (store closed, or the snapshot belongs to
    /// another session).
    pub fn apply_snapshot(&self, snapshot: GameSnapshot) -> bool {
        if self.is_closed() {
            tracing::debug!(session = %self.inner.session, "discarding snapshot after teardown");
            return false;
        }
        if snapshot.game_id != self.inner.session {
            tracing::warn!(
                session = %self.inner.session,
                received = %snapshot.game_id,
                "discarding snapshot for a different session"
            );
            return false;
        }

        let snapshot = Arc::new(snapshot);
        self.inner.view.send_modify(|view| view.snapshot = Some(snapshot));
        true
    }

    /// Records `error` without touching the snapshot.
    pub fn set_error(&self, error: ClientError) -> bool {
        if self.is_closed() {
            tracing::debug!(session = %self.inner.session, %error, "discarding error after teardown");
            return false;
        }
        self.inner.view.send_modify(|view| view.last_error = Some(error));
        true
    }

    /// Marks the store torn down. Later writes are no-ops.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.inner.session)
            .field("connected", &self.is_connected())
            .field("closed", &self.is_closed())
            .finish()
    }
}
