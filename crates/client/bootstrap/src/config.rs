//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use client_core::SessionConfig;
use game_core::{GameSetup, SessionId};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration required to bootstrap the client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub ws_url: String,
    /// Game to open; when `None` the runner creates one.
    pub game_id: Option<SessionId>,
    /// Seat to claim; when `None` the client only observes.
    pub player_name: Option<String>,
    pub human_players: usize,
    pub bot_players: usize,
    pub session: SessionConfig,
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: ws_url_for(DEFAULT_API_URL),
            game_id: None,
            player_name: None,
            human_players: 0,
            bot_players: 4,
            session: SessionConfig::default(),
            log_dir: None,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BURACO_API_URL` - Game service root (default: http://localhost:8000)
    /// - `BURACO_WS_URL` - WebSocket root (default: derived from the API URL)
    /// - `BURACO_GAME_ID` - Game to open (default: create a new one)
    /// - `BURACO_PLAYER_NAME` - Join under this name (default: observe only)
    /// - `BURACO_HUMAN_PLAYERS` - Open human seats when creating (default: 0)
    /// - `BURACO_BOT_PLAYERS` - Random bots when creating (default: 4)
    /// - `BURACO_AUTO_START` - Start all-bot games automatically (default: true)
    /// - `BURACO_PRESENCE_CAPACITY` - Presence notice buffer (default: 64)
    /// - `BURACO_LOG_DIR` - Log directory (default: platform-specific)
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = non_empty(var("BURACO_API_URL")) {
            config.ws_url = ws_url_for(&url);
            config.api_url = url;
        }
        if let Some(url) = non_empty(var("BURACO_WS_URL")) {
            config.ws_url = url;
        }

        config.game_id = non_empty(var("BURACO_GAME_ID")).map(SessionId::new);
        config.player_name = non_empty(var("BURACO_PLAYER_NAME"));

        if let Some(humans) = parse(var("BURACO_HUMAN_PLAYERS")) {
            config.human_players = humans;
        }
        if let Some(bots) = parse(var("BURACO_BOT_PLAYERS")) {
            config.bot_players = bots;
        }

        if let Some(enable) = parse_bool(var("BURACO_AUTO_START")) {
            config.session.auto_start = enable;
        }
        if let Some(capacity) = parse::<usize>(var("BURACO_PRESENCE_CAPACITY")) {
            config.session.presence_capacity = capacity.max(1);
        }

        config.log_dir = non_empty(var("BURACO_LOG_DIR")).map(PathBuf::from);

        config
    }

    /// Seats requested when this client creates the game.
    pub fn game_setup(&self) -> GameSetup {
        GameSetup::with_bots(self.human_players, self.bot_players)
    }
}

/// `http://` becomes `ws://`, `https://` becomes `wss://`.
pub fn ws_url_for(api_url: &str) -> String {
    if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    value?.trim().parse().ok()
}

fn parse_bool(value: Option<String>) -> Option<bool> {
    match value?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]);
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.ws_url, "ws://localhost:8000");
        assert_eq!(config.game_id, None);
        assert_eq!(config.bot_players, 4);
        assert!(config.session.auto_start);
        assert_eq!(config.session.presence_capacity, 64);
        assert!(config.game_setup().validate().is_ok());
    }

    #[test]
    fn ws_url_follows_api_scheme() {
        assert_eq!(
            config(&[("BURACO_API_URL", "https://buraco.example")]).ws_url,
            "wss://buraco.example"
        );
        let explicit = config(&[
            ("BURACO_API_URL", "https://buraco.example"),
            ("BURACO_WS_URL", "ws://stream.local:9000"),
        ]);
        assert_eq!(explicit.ws_url, "ws://stream.local:9000");
    }

    #[test]
    fn reads_session_settings() {
        let config = config(&[
            ("BURACO_GAME_ID", "abc"),
            ("BURACO_PLAYER_NAME", "Ana"),
            ("BURACO_HUMAN_PLAYERS", "1"),
            ("BURACO_BOT_PLAYERS", "1"),
            ("BURACO_AUTO_START", "off"),
            ("BURACO_PRESENCE_CAPACITY", "0"),
            ("BURACO_LOG_DIR", "/tmp/buraco"),
        ]);

        assert_eq!(config.game_id, Some(SessionId::new("abc")));
        assert_eq!(config.player_name.as_deref(), Some("Ana"));
        assert_eq!(config.game_setup().total_players(), 2);
        assert!(!config.session.auto_start);
        assert_eq!(config.session.presence_capacity, 1);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/buraco")));
    }

    #[test]
    fn ignores_blank_and_unparsable_values() {
        let config = config(&[
            ("BURACO_GAME_ID", "  "),
            ("BURACO_BOT_PLAYERS", "many"),
            ("BURACO_AUTO_START", "maybe"),
        ]);

        assert_eq!(config.game_id, None);
        assert_eq!(config.bot_players, 4);
        assert!(config.session.auto_start);
    }
}
