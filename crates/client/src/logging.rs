//! Logging to stderr and to a per-game log file.
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use client_bootstrap::ClientConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_FILE: &str = "client.log";

/// Platform log directory for the client.
///
/// - macOS: `~/Library/Caches/buraco/logs`
/// - Linux: `~/.cache/buraco/logs` (or `$XDG_CACHE_HOME/buraco/logs`)
/// - Windows: `%LOCALAPPDATA%\buraco\cache\logs`
/// - Fallback: `/tmp/buraco/logs`
pub fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "buraco")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/buraco"))
        .join("logs")
}

/// Creates `<base>/<label>` and returns the log file path inside it.
pub fn prepare_log_file(base: &Path, label: &str) -> Result<PathBuf> {
    let dir = base.join(label);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    Ok(dir.join(LOG_FILE))
}

/// Directory name for this run: the game id, or a timestamped placeholder.
pub fn run_label(config: &ClientConfig) -> String {
    match &config.game_id {
        Some(id) => id.to_string(),
        None => {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            format!("new_game_{secs}")
        }
    }
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn setup_logging(config: &ClientConfig) -> Result<WorkerGuard> {
    let base = config.log_dir.clone().unwrap_or_else(default_log_dir);
    let label = run_label(config);
    let log_file = prepare_log_file(&base, &label)?;

    let dir = log_file.parent().unwrap_or(&base);
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking_file).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(run = %label, file = %log_file.display(), "logging initialized");
    Ok(guard)
}
