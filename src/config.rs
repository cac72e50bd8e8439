//! Server configuration from environment variables

use std::path::PathBuf;
use thiserror::Error;

/// Default listen port when `PORT` is unset
pub const DEFAULT_PORT: u16 = 3001;

/// Default model name for the upstream connector
pub const DEFAULT_UPSTREAM_MODEL: &str = "gpt-4o-mini";

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),

    #[error("Unknown CHAT_CONNECTOR value: {0} (expected \"mock\" or \"upstream\")")]
    UnknownConnector(String),

    #[error("CHAT_CONNECTOR=upstream requires CHAT_UPSTREAM_URL")]
    MissingUpstreamUrl,
}

/// Which connector implementation replies to messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorSettings {
    /// Canned word-by-word demo connector (default)
    Mock,
    /// OpenAI-compatible chat completions endpoint
    Upstream {
        base_url: String,
        api_key: Option<String>,
        model: String,
    },
}

/// Runtime configuration for the server process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port to listen on
    pub port: u16,
    /// When set, serve this SPA bundle with an index.html fallback
    pub static_dir: Option<PathBuf>,
    pub connector: ConnectorSettings,
}

impl ServerConfig {
    /// Read configuration from process environment variables:
    /// `PORT`, `STATIC_DIR`, `CHAT_CONNECTOR`, `CHAT_UPSTREAM_URL`,
    /// `CHAT_UPSTREAM_API_KEY`, `CHAT_UPSTREAM_MODEL`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup (tests pass
    /// a closure over a map)
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let static_dir = get("STATIC_DIR").map(PathBuf::from);

        let connector = match get("CHAT_CONNECTOR").as_deref() {
            None | Some("mock") => ConnectorSettings::Mock,
            Some("upstream") => ConnectorSettings::Upstream {
                base_url: get("CHAT_UPSTREAM_URL").ok_or(ConfigError::MissingUpstreamUrl)?,
                api_key: get("CHAT_UPSTREAM_API_KEY"),
                model: get("CHAT_UPSTREAM_MODEL")
                    .unwrap_or_else(|| DEFAULT_UPSTREAM_MODEL.to_string()),
            },
            Some(other) => return Err(ConfigError::UnknownConnector(other.to_string())),
        };

        Ok(Self {
            port,
            static_dir,
            connector,
        })
    }
}
