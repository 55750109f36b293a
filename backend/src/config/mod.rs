//! Process configuration.
//!
//! Values start from [`Config::default`], are optionally replaced by a TOML
//! file named in `RSVP_CONFIG`, and are finally overridden one by one from the
//! environment.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite database file holding groups, guests and messages.
    pub database: PathBuf,
    /// Roster file the guest list is reconciled from.
    pub roster: PathBuf,
    pub reconcile_on_startup: bool,
    /// Seconds between periodic reconciliation passes, `0` disables them.
    pub reconcile_interval_secs: u64,
    /// Endpoint receiving submission summaries; summaries are only logged
    /// when unset.
    pub notify_webhook: Option<String>,
    /// Maximum accepted JSON body size, in bytes.
    pub json_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database: PathBuf::from("rsvp.sqlite"),
            roster: PathBuf::from("guests.csv"),
            reconcile_on_startup: true,
            reconcile_interval_secs: 3600,
            notify_webhook: None,
            json_limit: 64 * 1024,
        }
    }
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads the configuration, resolving variables through `lookup`.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("RSVP_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(host) = lookup("RSVP_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse_value("PORT", port)?;
        }
        if let Some(database) = lookup("RSVP_DATABASE") {
            config.database = PathBuf::from(database);
        }
        if let Some(roster) = lookup("RSVP_ROSTER") {
            config.roster = PathBuf::from(roster);
        }
        if let Some(interval) = lookup("RSVP_RECONCILE_INTERVAL") {
            config.reconcile_interval_secs = parse_value("RSVP_RECONCILE_INTERVAL", interval)?;
        }
        if let Some(url) = lookup("RSVP_NOTIFY_WEBHOOK") {
            config.notify_webhook = Some(url).filter(|u| !u.trim().is_empty());
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
