//! Tracing setup for the node binary.
//!
//! stdout carries wire frames, so human-readable logs go to stderr and to a
//! per-node file.
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::NodeConfig;

/// Platform log directory for relay nodes.
///
/// - macOS: `~/Library/Caches/relay/logs`
/// - Linux: `~/.cache/relay/logs` (or `$XDG_CACHE_HOME/relay/logs`)
/// - Windows: `%LOCALAPPDATA%\relay\logs`
/// - Fallback: `/tmp/relay/logs`
pub fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "relay")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/relay"))
        .join("logs")
}

pub fn setup_logging(config: &NodeConfig) -> Result<()> {
    let node_log_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(default_log_dir)
        .join(config.runtime.node_id.as_str());
    std::fs::create_dir_all(&node_log_dir)
        .with_context(|| format!("failed to create log directory {}", node_log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&node_log_dir, "relay.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    // The writer lives for the whole process.
    std::mem::forget(guard);

    tracing::info!(node = %config.runtime.node_id, "logging initialized");
    tracing::info!("log file: {}/relay.log", node_log_dir.display());

    Ok(())
}
