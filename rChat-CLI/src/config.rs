//! Configuration management for the chat CLI.

use anyhow::{bail, Context, Result};
use rchat::{ChatClient, FileSessionStore};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// CLI configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API base URL.
    pub base_url: Option<String>,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

fn exe_dir() -> Result<PathBuf> {
    let exe_path = env::current_exe().context("Could not determine executable path")?;
    let exe_dir = exe_path
        .parent()
        .context("Could not determine executable directory")?;

    Ok(exe_dir.to_path_buf())
}

/// Get the configuration file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(exe_dir()?.join("rchat.toml"))
}

/// Get the session file path.
pub fn session_path() -> Result<PathBuf> {
    Ok(exe_dir()?.join("rchat-session.json"))
}

/// Load configuration from a file, defaulting when it does not exist.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).context("Failed to read config file")?;

    toml::from_str(&content).context("Failed to parse config file")
}

/// Load configuration from the default location.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Save configuration to a file.
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, content).context("Failed to write config file")?;

    Ok(())
}

/// Save configuration to the default location.
pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &config_path()?)
}

/// Build a client from the configuration, restoring any saved session.
///
/// `base_url` overrides the configured URL.
pub async fn build_client(base_url: Option<&str>) -> Result<ChatClient> {
    let config = load_config()?;
    let store = Arc::new(FileSessionStore::new(session_path()?));

    let mut builder = ChatClient::builder().session_store(store);

    if let Some(url) = base_url.or(config.server.base_url.as_deref()) {
        builder = builder.base_url(url);
    }
    if let Some(secs) = config.server.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.server.read_timeout_secs {
        builder = builder.read_timeout(Duration::from_secs(secs));
    }

    let client = builder.build().context("Failed to build chat client")?;
    client
        .restore_session()
        .await
        .context("Failed to restore session")?;

    Ok(client)
}

/// Build a client that requires a logged-in session.
pub async fn build_authed_client(base_url: Option<&str>) -> Result<ChatClient> {
    let client = build_client(base_url).await?;

    if !client.is_authenticated() {
        bail!("Authentication required. Run 'rchat auth login' first.");
    }

    Ok(client)
}
