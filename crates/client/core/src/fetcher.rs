//! One-shot bootstrap fetch of a session's full state.
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::GameApi;
use crate::error::Result;
use crate::store::SessionStore;

#[derive(Clone)]
pub struct SnapshotFetcher {
    api: Arc<dyn GameApi>,
    store: SessionStore,
}

impl SnapshotFetcher {
    pub fn new(api: Arc<dyn GameApi>, store: SessionStore) -> Self {
        Self { api, store }
    }

    /// Single attempt, no retry.
    ///
    /// Success replaces the stored snapshot; failure is recorded in the error
    /// slot and leaves any earlier snapshot in place.
    pub async fn fetch(&self) -> Result<()> {
        let session = self.store.session_id();
        match self.api.fetch_snapshot(session).await {
            Ok(snapshot) => {
                debug!(%session, players = snapshot.player_count(), "bootstrap snapshot fetched");
                self.store.apply_snapshot(snapshot);
                Ok(())
            }
            Err(err) => {
                warn!(%session, error = %err, "bootstrap fetch failed");
                self.store.set_error(err.clone());
                Err(err)
            }
        }
    }

    /// Runs [`Self::fetch`] in the background. The task is never cancelled;
    /// a result landing after teardown is discarded by the store.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let _ = self.fetch().await;
        })
    }
}
