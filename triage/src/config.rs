//! User configuration for triage.
//!
//! Settings resolve in layers: built-in defaults, then
//! `$XDG_CONFIG_HOME/triage/config.toml`, then `TRIAGE_API_URL` /
//! `TRIAGE_TOKEN`, then command-line flags. A missing config file is normal;
//! a malformed one is reported and ignored so the tool still starts.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Effective settings after all layers are applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub theme: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            token: None,
            theme: "catppuccin-mocha".to_owned(),
            log_file: None,
        }
    }
}

/// Overrides taken from the command line; `None` leaves the lower layer alone.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub theme: Option<String>,
}

impl Config {
    /// Parses a config file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path: path.to_owned(), source }),
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
    }

    /// Applies environment variables, read through `lookup` so tests stay hermetic.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("TRIAGE_API_URL").filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup("TRIAGE_TOKEN").filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        self
    }

    pub fn apply_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.api_url {
            self.api_url = url;
        }
        if let Some(token) = overrides.token {
            self.token = Some(token);
        }
        if let Some(theme) = overrides.theme {
            self.theme = theme;
        }
        self
    }

    /// Loads every layer from the real environment.
    ///
    /// Config file errors are soft: they are returned alongside the defaults so
    /// the caller can log them once logging is up.
    pub fn load(overrides: Overrides) -> (Self, Option<ConfigError>) {
        let (file, err) = match Self::from_file(&config_path()) {
            Ok(c) => (c, None),
            Err(e) => (Self::default(), Some(e)),
        };
        let config = file.apply_env(|k| std::env::var(k).ok()).apply_overrides(overrides);
        (config, err)
    }

    /// Where diagnostics are written; never the terminal the UI owns.
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            xdg_dir("XDG_STATE_HOME", ".local/state").join("triage").join("triage.log")
        })
    }
}

/// Returns `$XDG_CONFIG_HOME/triage/config.toml`, falling back to `~/.config`.
pub fn config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join("triage").join("config.toml")
}

fn xdg_dir(var: &str, home_relative: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(home_relative)))
        .unwrap_or_else(|| PathBuf::from(home_relative))
}
