//! Configuration loading and management.
//!
//! Loads keywatch configuration from `./keywatch.toml` (or `$KEYWATCH_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//! A `./.env` file supplies fallback values for the override variables, so the
//! webhook URL can stay out of the TOML file.
//!
//! Precedence: env vars > `.env` file > config file > defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::keywords::{default_rules, KeywordRule};

// ── Top-level config ────────────────────────────────────────────

/// Top-level keywatch configuration loaded from TOML.
///
/// Path: `./keywatch.toml` or `$KEYWATCH_CONFIG_PATH`. Every field has a
/// built-in default, so any subset of the file may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeywatchConfig {
    /// Log file tailing settings (`[watch]`).
    pub watch: WatchConfig,
    /// Discord webhook settings (`[webhook]`).
    pub webhook: WebhookConfig,
    /// Keyword rule set (`[[keywords.rules]]`).
    pub keywords: KeywordsConfig,
}

impl KeywatchConfig {
    /// Load configuration with precedence: env vars > `.env` file > TOML file > defaults.
    ///
    /// Config file path: `$KEYWATCH_CONFIG_PATH` or `./keywatch.toml`.
    /// If the file does not exist, returns defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        let env_file = load_env_file(Path::new(".env"));
        config.apply_overrides(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| env_file.get(key).cloned())
        });
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file() -> Result<Self> {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: KeywatchConfig = toml::from_str(&contents)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(KeywatchConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve config file path.
    ///
    /// Checks `$KEYWATCH_CONFIG_PATH` first, then `./keywatch.toml` in the
    /// working directory.
    fn config_path() -> PathBuf {
        Self::config_path_with(|key| std::env::var(key).ok())
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = env("KEYWATCH_CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("keywatch.toml")
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Watch.
        if let Some(v) = env("KEYWATCH_LOG_PATH") {
            self.watch.path = v;
        }
        if let Some(v) = env("KEYWATCH_POLL_INTERVAL_SECS") {
            match v.parse() {
                Ok(n) => self.watch.poll_interval_seconds = n,
                Err(_) => tracing::warn!(
                    var = "KEYWATCH_POLL_INTERVAL_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Webhook (env var presence sets the URL).
        if let Some(v) = env("KEYWATCH_WEBHOOK_URL") {
            self.webhook.url = Some(v);
        }
    }

    /// Parse a TOML string into config (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: KeywatchConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

/// Parse a dotenv-style file into a key-value map.
///
/// A missing file yields an empty map. Other read or parse failures are
/// logged and yield whatever parsed cleanly.
fn load_env_file(path: &Path) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => return vars,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read env file");
            return vars;
        }
    };

    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed env file entry");
            }
        }
    }

    vars
}

// ── Watch config ────────────────────────────────────────────────

/// Log file tailing settings (`[watch]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Path of the log file to tail.
    ///
    /// Minecraft rewrites `latest.log` on rotation, so the watcher follows
    /// the path, not the open file.
    pub path: String,
    /// Seconds between polls while the log file is attached.
    pub poll_interval_seconds: u64,
    /// Seconds between attach attempts while the log file is missing.
    pub retry_interval_seconds: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            path: "logs/latest.log".to_string(),
            poll_interval_seconds: 15,
            retry_interval_seconds: 1,
        }
    }
}

// ── Webhook config ──────────────────────────────────────────────

/// Discord webhook settings (`[webhook]`).
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Full webhook URL, including its embedded token.
    ///
    /// `None` disables delivery; `keywatch start` refuses to run without it.
    pub url: Option<String>,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url.as_ref().map(|_| "__REDACTED__"))
            .finish()
    }
}

// ── Keywords config ─────────────────────────────────────────────

/// Keyword rule set (`[[keywords.rules]]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeywordsConfig {
    /// Rules to compile into the matching automaton.
    ///
    /// A `rules` key in the file replaces the built-in set entirely; omitting
    /// it keeps the built-ins.
    pub rules: Vec<KeywordRule>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
