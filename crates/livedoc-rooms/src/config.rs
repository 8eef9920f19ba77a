//! Backend configuration from environment variables.

use std::str::FromStr;

use crate::error::{RoomsError, RoomsResult};

/// Default Liveblocks API base URL.
pub const DEFAULT_API_URL: &str = "https://api.liveblocks.io";

/// Default timeout for a single request to the service.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Which backend serves room operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Liveblocks REST API.
    Liveblocks,
    /// In-process rooms, lost on restart.
    Memory,
}

impl FromStr for BackendKind {
    type Err = RoomsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "liveblocks" => Ok(Self::Liveblocks),
            "memory" => Ok(Self::Memory),
            other => Err(RoomsError::Config(format!(
                "unknown ROOMS_BACKEND '{}', expected 'liveblocks' or 'memory'",
                other
            ))),
        }
    }
}

/// Configuration for the room backend.
#[derive(Debug, Clone)]
pub struct RoomsConfig {
    /// Backend to use.
    pub backend: BackendKind,
    /// Base URL of the Liveblocks API.
    pub api_url: String,
    /// Liveblocks secret key (`sk_...`). Empty for the memory backend.
    pub secret_key: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            api_url: DEFAULT_API_URL.to_string(),
            secret_key: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl RoomsConfig {
    /// Configuration for the Liveblocks backend.
    pub fn liveblocks(api_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Liveblocks,
            api_url: api_url.into(),
            secret_key: secret_key.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads:
    /// - `ROOMS_BACKEND` - Optional, `liveblocks` (default) or `memory`
    /// - `LIVEBLOCKS_SECRET_KEY` - Required for the Liveblocks backend
    /// - `LIVEBLOCKS_API_URL` - Optional, defaults to `https://api.liveblocks.io`
    /// - `LIVEBLOCKS_TIMEOUT_SECS` - Optional, defaults to 10
    pub fn from_env() -> RoomsResult<Self> {
        let backend = match std::env::var("ROOMS_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => BackendKind::Liveblocks,
        };

        let secret_key = std::env::var("LIVEBLOCKS_SECRET_KEY").unwrap_or_default();
        if backend == BackendKind::Liveblocks && secret_key.is_empty() {
            return Err(RoomsError::Config(
                "LIVEBLOCKS_SECRET_KEY environment variable not set".to_string(),
            ));
        }

        let api_url = std::env::var("LIVEBLOCKS_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let request_timeout_secs = std::env::var("LIVEBLOCKS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            backend,
            api_url,
            secret_key,
            request_timeout_secs,
        })
    }
}
