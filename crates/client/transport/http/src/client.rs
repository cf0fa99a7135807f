//! reqwest-backed game service client.

use async_trait::async_trait;
use client_core::{ClientError, GameApi, Result};
use game_core::{CreatedGame, GameSetup, GameSnapshot, PlayerRecord, SessionId};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::types::JoinRequest;

/// Game service client using the REST API.
///
/// One request per call and no retries; failures map onto [`ClientError`]
/// (404 to `NotFound`, 409 to `Conflict`, other statuses to `Rejected`).
#[derive(Clone, Debug)]
pub struct HttpGameApi {
    /// Service root, without a trailing slash.
    base_url: String,

    http_client: reqwest::Client,
}

impl HttpGameApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn game_url(&self, session: &SessionId) -> String {
        format!("{}/games/{}", self.base_url, session)
    }

    fn join_url(&self, session: &SessionId) -> String {
        format!("{}/join", self.game_url(session))
    }

    fn start_url(&self, session: &SessionId) -> String {
        format!("{}/start", self.game_url(session))
    }

    fn create_url(&self) -> String {
        format!("{}/games/create_configured", self.base_url)
    }

    /// Sends `request`, checks the status and returns the body text.
    async fn execute(
        &self,
        session: Option<&SessionId>,
        request: reqwest::RequestBuilder,
    ) -> Result<String> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), %body, "game service rejected request");
            return Err(status_error(session, status, body));
        }
        Ok(body)
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn fetch_snapshot(&self, session: &SessionId) -> Result<GameSnapshot> {
        let url = self.game_url(session);
        tracing::debug!(%url, "fetching game snapshot");

        let body = self
            .execute(Some(session), self.http_client.get(&url))
            .await?;
        parse(&body)
    }

    async fn join_game(&self, session: &SessionId, player_name: &str) -> Result<PlayerRecord> {
        let url = self.join_url(session);
        tracing::debug!(%url, player_name, "joining game");

        let request = self
            .http_client
            .post(&url)
            .json(&JoinRequest { player_name });
        let body = self.execute(Some(session), request).await?;
        parse(&body)
    }

    async fn start_game(&self, session: &SessionId) -> Result<()> {
        let url = self.start_url(session);
        tracing::debug!(%url, "starting game");

        self.execute(Some(session), self.http_client.post(&url))
            .await?;
        Ok(())
    }

    async fn create_game(&self, setup: &GameSetup) -> Result<SessionId> {
        let url = self.create_url();
        tracing::debug!(
            %url,
            humans = setup.human_players,
            bots = setup.bot_players.len(),
            "creating configured game"
        );

        let body = self
            .execute(None, self.http_client.post(&url).json(setup))
            .await?;
        let created: CreatedGame = parse(&body)?;
        Ok(created.game_id)
    }
}

fn network_error(err: reqwest::Error) -> ClientError {
    ClientError::Network(err.to_string())
}

fn status_error(session: Option<&SessionId>, status: StatusCode, body: String) -> ClientError {
    match (status, session) {
        (StatusCode::NOT_FOUND, Some(session)) => ClientError::NotFound(session.clone()),
        (StatusCode::CONFLICT, Some(session)) => ClientError::Conflict(session.clone()),
        _ => ClientError::Rejected {
            status: status.as_u16(),
            body,
        },
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|err| ClientError::Decode(err.to_string()))
}
