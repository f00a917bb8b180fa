//! Client configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` loads `.env` (if present) before calling [`Config::from_env`], then
//! overlays command-line flags. Every value has a default so a bare invocation
//! talks to a local backend.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SHARE_POLL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const TOKEN_DIR: &str = ".surveyhub";
const TOKEN_FILE: &str = "tokens.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL {0:?}: expected http:// or https://")]
    InvalidBaseUrl(String),
    #[error("invalid value for {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("cannot locate a home directory; set SURVEYHUB_TOKEN_FILE")]
    NoHomeDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend origin without a trailing slash.
    pub base_url: String,
    /// JSON file holding `accessToken` / `refreshToken`.
    pub token_file: PathBuf,
    pub share_poll_interval: Duration,
    pub timeouts: Timeouts,
}

impl Config {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `SURVEYHUB_BASE_URL`: default `http://127.0.0.1:5000`
    /// - `SURVEYHUB_TOKEN_FILE`: default `<home>/.surveyhub/tokens.json`
    /// - `SURVEYHUB_SHARE_POLL_SECS`: default 60
    /// - `SURVEYHUB_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SURVEYHUB_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed URL or number, or when no token file is
    /// configured and the home directory is unknown.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build config from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = match lookup("SURVEYHUB_BASE_URL") {
            Some(url) if !url.trim().is_empty() => normalize_base_url(&url)?,
            _ => DEFAULT_BASE_URL.to_owned(),
        };
        let token_file = match lookup("SURVEYHUB_TOKEN_FILE") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => default_token_file()?,
        };
        let poll_secs = parse_u64(&lookup, "SURVEYHUB_SHARE_POLL_SECS", DEFAULT_SHARE_POLL_SECS)?;
        let timeouts = Timeouts {
            request_secs: parse_u64(&lookup, "SURVEYHUB_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_u64(&lookup, "SURVEYHUB_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self { base_url, token_file, share_poll_interval: Duration::from_secs(poll_secs.max(1)), timeouts })
    }

    /// Apply a `--base-url` override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for a non-HTTP URL.
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(url) = base_url {
            self.base_url = normalize_base_url(url)?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_token_file(mut self, token_file: Option<PathBuf>) -> Self {
        if let Some(path) = token_file {
            self.token_file = path;
        }
        self
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn default_token_file() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(TOKEN_DIR).join(TOKEN_FILE))
        .ok_or(ConfigError::NoHomeDir)
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
        _ => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
