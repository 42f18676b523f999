//! Layered client configuration.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory under the user's config root holding `config.toml`.
pub const CONFIG_DIR: &str = "playpoint";
/// Prefix for environment overrides, e.g. `PLAYPOINT_API_URL`.
pub const ENV_PREFIX: &str = "PLAYPOINT";

const DEFAULT_API_URL: &str = "http://127.0.0.1:8888";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Runtime settings for talking to the PlayPoint backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the backend, without a trailing slash.
    pub api_url: String,
    /// Chat polling period while a joined game is in focus.
    pub poll_interval_ms: u64,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// Load from the default config file plus `PLAYPOINT_*` environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_layered(&config_path(), ENV_PREFIX)
    }

    /// Load from an explicit file, layering defaults, the file, then the environment.
    pub fn load_layered(path: &Path, env_prefix: &str) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("poll_interval_ms", defaults.poll_interval_ms)?
            .set_default("request_timeout_ms", defaults.request_timeout_ms)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let mut config: Self = settings
            .try_deserialize()
            .context("invalid configuration values")?;
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        if config.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than zero");
        }
        Ok(config)
    }

    /// Chat polling period.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Location of the user's `config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write a config file with default values if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let defaults = AppConfig::default();
    let contents = format!(
        "# PlayPoint client settings\napi_url = \"{}\"\npoll_interval_ms = {}\nrequest_timeout_ms = {}\n",
        defaults.api_url, defaults.poll_interval_ms, defaults.request_timeout_ms
    );
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}
