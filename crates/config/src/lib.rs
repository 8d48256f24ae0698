use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default location of the optional tunables file, relative to the working
/// directory of the process.
pub const DEFAULT_CONFIG_PATH: &str = "config/dom5-notify.toml";

/// Seconds between two modification-time checks of the status page.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Number of most recent channel messages consulted before announcing a turn.
///
/// Turns announced further back than this window are invisible to the
/// duplicate check, so a restart after a long quiet period can re-announce
/// the current turn.
pub const DEFAULT_HISTORY_WINDOW: usize = 100;

pub const DEFAULT_DISCORD_API_BASE_URL: &str = "https://discord.com/api/v10";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Base URL of the Discord REST API.  Only useful to point the client at
    /// a proxy or a local stand-in.
    pub api_base_url: String,
    /// How many recent messages are fetched for the duplicate check.
    /// Discord serves at most 100 messages per page; larger values are
    /// clamped by the client.
    pub history_window: usize,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_DISCORD_API_BASE_URL.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Fallback filter directive when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub watch: WatchConfig,
    pub discord: DiscordConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load tunables from `path`, falling back to defaults when the file does
    /// not exist, then apply environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err)
                .with_context(|| format!("cannot read config file {}", path.display())),
        }
    }

    /// Environment values win over the file.  Empty values are ignored;
    /// values that do not parse are an error.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(value) = lookup("DOM5_POLL_INTERVAL_SECS") {
            if !value.trim().is_empty() {
                self.watch.poll_interval_secs = value
                    .trim()
                    .parse()
                    .with_context(|| format!("DOM5_POLL_INTERVAL_SECS is not a number: {value}"))?;
            }
        }

        if let Some(value) = lookup("DOM5_HISTORY_WINDOW") {
            if !value.trim().is_empty() {
                self.discord.history_window = value
                    .trim()
                    .parse()
                    .with_context(|| format!("DOM5_HISTORY_WINDOW is not a number: {value}"))?;
            }
        }

        Ok(())
    }

    /// Poll interval as a `Duration`.  A zero interval would spin on the
    /// file, so it is treated as unset.
    pub fn poll_interval(&self) -> Duration {
        match self.watch.poll_interval_secs {
            0 => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn history_window(&self) -> usize {
        match self.discord.history_window {
            0 => DEFAULT_HISTORY_WINDOW,
            n => n,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
