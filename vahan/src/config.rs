//! Client configuration.
//!
//! Resolution order, later wins:
//! 1. built-in defaults
//! 2. `~/.vahan/config.toml`
//! 3. `VAHAN_API_URL`, `VAHAN_WS_URL`, `VAHAN_DATA_DIR`
//! 4. command-line flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

const CONFIG_DIR: &str = ".vahan";
const CONFIG_FILE: &str = "config.toml";
const STORAGE_DIR: &str = "storage";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the HTTP API (routes live under `/api`).
    pub api_url: String,
    /// Base URL of the chat socket. Derived from `api_url` when unset.
    pub ws_url: Option<String>,
    /// Storage directory. Defaults to `~/.vahan/storage`.
    pub data_dir: Option<PathBuf>,
    /// Per-request HTTP timeout. No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: None,
            data_dir: None,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// `~/.vahan`
    pub fn home_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|h| h.join(CONFIG_DIR))
            .ok_or(ConfigError::NoHomeDir)
    }

    /// Load from an explicit file, or from `~/.vahan/config.toml` when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::home_dir()?.join(CONFIG_FILE),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `VAHAN_*` overrides from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `VAHAN_*` overrides from an arbitrary lookup.
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(api) = non_empty("VAHAN_API_URL") {
            self.api_url = api;
        }
        if let Some(ws) = non_empty("VAHAN_WS_URL") {
            self.ws_url = Some(ws);
        }
        if let Some(dir) = non_empty("VAHAN_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Validated HTTP base URL.
    pub fn api_base(&self) -> Result<Url, ConfigError> {
        let url = parse_url(&self.api_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidUrl {
                value: self.api_url.clone(),
                reason: format!("expected http or https, got {other}"),
            }),
        }
    }

    /// Socket base URL: `ws_url` if set, otherwise `api_url` with
    /// `http` -> `ws` and `https` -> `wss`.
    pub fn ws_base(&self) -> Result<Url, ConfigError> {
        if let Some(ws) = &self.ws_url {
            let url = parse_url(ws)?;
            return match url.scheme() {
                "ws" | "wss" => Ok(url),
                other => Err(ConfigError::InvalidUrl {
                    value: ws.clone(),
                    reason: format!("expected ws or wss, got {other}"),
                }),
            };
        }

        let mut url = self.api_base()?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|()| ConfigError::InvalidUrl {
            value: self.api_url.clone(),
            reason: format!("cannot switch scheme to {scheme}"),
        })?;
        Ok(url)
    }

    pub fn storage_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::home_dir()?.join(STORAGE_DIR)),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|e| ConfigError::InvalidUrl {
        value: value.to_string(),
        reason: e.to_string(),
    })
}
