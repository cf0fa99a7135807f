//! Assembles the game client from configuration.
use std::sync::Arc;

use anyhow::{Context, Result};
use client_core::{Connector, GameApi, GameClient, LifecycleGuard};
use client_transport_http::HttpGameApi;
use client_transport_ws::WsConnector;

use crate::config::ClientConfig;

/// Builder that wires transports and configuration into a [`GameClient`].
///
/// Defaults to the HTTP API at `config.api_url` and the WebSocket connector at
/// `config.ws_url`; either can be replaced before [`Self::build`].
pub struct ClientBuilder {
    config: ClientConfig,
    api: Option<Arc<dyn GameApi>>,
    connector: Option<Arc<dyn Connector>>,
    guard: Option<Arc<LifecycleGuard>>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            api: None,
            connector: None,
            guard: None,
        }
    }

    /// Use a custom game service client (e.g. an in-memory one).
    pub fn api(mut self, api: Arc<dyn GameApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Share a lifecycle guard with another client.
    pub fn guard(mut self, guard: Arc<LifecycleGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn build(self) -> Result<ClientSetup> {
        let api = self.api.unwrap_or_else(|| {
            tracing::debug!(url = %self.config.api_url, "using HTTP game api");
            Arc::new(HttpGameApi::new(self.config.api_url.clone())) as Arc<dyn GameApi>
        });
        let connector = self.connector.unwrap_or_else(|| {
            tracing::debug!(url = %self.config.ws_url, "using websocket connector");
            Arc::new(WsConnector::new(self.config.ws_url.clone())) as Arc<dyn Connector>
        });

        let mut builder = GameClient::builder()
            .api(api)
            .connector(connector)
            .config(self.config.session.clone());
        if let Some(guard) = self.guard {
            builder = builder.guard(guard);
        }
        let client = builder.build().context("Failed to assemble game client")?;

        Ok(ClientSetup {
            config: self.config,
            client,
        })
    }
}

pub struct ClientSetup {
    pub config: ClientConfig,
    pub client: GameClient,
}
