//! Bidirectional text transport behind the real-time channel.
//!
//! [`Connector`] opens one [`Transport`] per session endpoint. The channel
//! only moves text frames through it; encoding and decoding stay in
//! `game-core`.
use async_trait::async_trait;
use game_core::SessionId;

use crate::error::Result;

#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Next inbound text frame.
    ///
    /// `None` means the peer closed the connection cleanly.
    async fn recv(&mut self) -> Option<Result<String>>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to the session-scoped endpoint.
    async fn connect(&self, session: &SessionId) -> Result<Box<dyn Transport>>;
}
