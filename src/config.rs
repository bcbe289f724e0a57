use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_SESSIONS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub bind_addr: SocketAddr,
    pub generation_timeout: Duration,
    /// Idle time after which a session is dropped.
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl Config {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()`
    /// first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("GEMINI_API_KEY must be set (environment or .env file)"))?;

        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let bind_addr = lookup("POET_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("POET_BIND_ADDR must be a socket address like 0.0.0.0:3000")?;

        let positive = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|value| *value > 0)
                    .ok_or_else(|| anyhow!("{key} must be a positive integer, got {raw:?}")),
                None => Ok(default),
            }
        };

        let timeout_secs = positive("POET_GENERATION_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let session_ttl_secs = positive("POET_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let max_sessions = usize::try_from(positive("POET_MAX_SESSIONS", DEFAULT_MAX_SESSIONS)?)
            .context("POET_MAX_SESSIONS is too large")?;

        Ok(Self {
            gemini: GeminiConfig {
                api_key,
                model,
                base_url,
            },
            bind_addr,
            generation_timeout: Duration::from_secs(timeout_secs),
            session_ttl: Duration::from_secs(session_ttl_secs),
            max_sessions,
        })
    }
}
