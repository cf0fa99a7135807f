//! [`Connector`] and [`Transport`] over tokio-tungstenite.
//!
//! Only text frames reach the channel. Ping/pong is answered by tungstenite
//! itself and binary frames are skipped; a close frame ends the stream.
use async_trait::async_trait;
use client_core::{ClientError, Connector, Result, Transport};
use futures_util::{SinkExt, StreamExt};
use game_core::SessionId;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens `{base}/ws/{session}` connections.
#[derive(Clone, Debug)]
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    /// `base_url` is a `ws://` or `wss://` root, e.g. `ws://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn endpoint(&self, session: &SessionId) -> String {
        format!("{}/ws/{}", self.base_url, session)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, session: &SessionId) -> Result<Box<dyn Transport>> {
        let url = self.endpoint(session);
        tracing::debug!(%url, "connecting websocket");

        let (socket, response) = connect_async(url.as_str())
            .await
            .map_err(|err| ClientError::Channel(format!("connect to {url} failed: {err}")))?;
        tracing::debug!(%url, status = %response.status(), "websocket handshake complete");

        Ok(Box::new(WsTransport { socket }))
    }
}

pub struct WsTransport {
    socket: Socket,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, frame: String) -> Result<()> {
        self.socket
            .send(Message::Text(frame))
            .await
            .map_err(|err| ClientError::Channel(err.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "websocket closed by peer");
                    return None;
                }
                Ok(Message::Binary(data)) => {
                    tracing::debug!(bytes = data.len(), "skipping binary frame");
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(err) => return Some(Err(ClientError::Channel(err.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.socket
            .close(None)
            .await
            .map_err(|err| ClientError::Channel(err.to_string()))
    }
}
