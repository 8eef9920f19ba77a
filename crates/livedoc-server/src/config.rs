//! Server configuration from environment variables.

use std::env;

use jsonwebtoken::Algorithm;

/// App metadata and identity-provider appearance served to the page shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Page title.
    pub title: String,
    /// Page description.
    pub description: String,
    /// Identity-provider base theme.
    pub base_theme: String,
    /// Primary accent color.
    pub color_primary: String,
    /// Base font size.
    pub font_size: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: "LiveDoc".to_string(),
            description: "Your go-to collaborative documentation tool".to_string(),
            base_theme: "dark".to_string(),
            color_primary: "#3371FF".to_string(),
            font_size: "16px".to_string(),
        }
    }
}

impl ShellConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| env::var(name).unwrap_or(default);

        Self {
            title: var("APP_TITLE", defaults.title),
            description: var("APP_DESCRIPTION", defaults.description),
            base_theme: var("THEME_BASE", defaults.base_theme),
            color_primary: var("THEME_COLOR_PRIMARY", defaults.color_primary),
            font_size: var("THEME_FONT_SIZE", defaults.font_size),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// CORS allowed origins (comma-separated or "*" for all).
    pub cors_allowed_origins: String,
    /// PEM public key used to verify identity tokens.
    pub jwt_public_key: String,
    /// Signature algorithm of identity tokens.
    pub jwt_algorithm: Algorithm,
    /// Expected `iss` claim, if any.
    pub jwt_issuer: Option<String>,
    /// Accept `X-User-Email` instead of a token (development only).
    pub allow_dev_identity: bool,
    /// How long cached room pages and listings stay fresh.
    pub page_cache_max_age_secs: u64,
    /// Page shell settings.
    pub shell: ShellConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".to_string(),
            cors_allowed_origins: "*".to_string(),
            jwt_public_key: String::new(),
            jwt_algorithm: Algorithm::EdDSA,
            jwt_issuer: None,
            allow_dev_identity: false,
            page_cache_max_age_secs: 60,
            shell: ShellConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `PORT`: Server port (default: 3000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    /// - `CORS_ALLOWED_ORIGINS`: Allowed CORS origins (default: "*")
    /// - `JWT_PUBLIC_KEY`: PEM key for identity tokens (default: empty)
    /// - `JWT_ALGORITHM`: `EdDSA` or `RS256` (default: "EdDSA")
    /// - `JWT_ISSUER`: Required issuer claim (default: unset)
    /// - `ALLOW_DEV_IDENTITY`: Accept `X-User-Email` (default: false)
    /// - `PAGE_CACHE_MAX_AGE_SECS`: Page cache freshness (default: 60)
    /// - `APP_TITLE`, `APP_DESCRIPTION`, `THEME_BASE`, `THEME_COLOR_PRIMARY`,
    ///   `THEME_FONT_SIZE`: page shell settings
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT".to_string(),
                reason: format!("'{}' is not a valid port", s),
            })?,
            Err(_) => defaults.port,
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or(defaults.log_level);

        let cors_allowed_origins =
            env::var("CORS_ALLOWED_ORIGINS").unwrap_or(defaults.cors_allowed_origins);

        // PEM keys in env files usually carry literal "\n".
        let jwt_public_key = env::var("JWT_PUBLIC_KEY")
            .map(|key| key.replace("\\n", "\n"))
            .unwrap_or_default();

        let jwt_algorithm = match env::var("JWT_ALGORITHM") {
            Ok(s) => parse_algorithm(&s)?,
            Err(_) => defaults.jwt_algorithm,
        };

        let jwt_issuer = env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty());

        let allow_dev_identity = env::var("ALLOW_DEV_IDENTITY")
            .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
            .unwrap_or(false);

        let page_cache_max_age_secs = env::var("PAGE_CACHE_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.page_cache_max_age_secs);

        Ok(Self {
            port,
            log_level,
            cors_allowed_origins,
            jwt_public_key,
            jwt_algorithm,
            jwt_issuer,
            allow_dev_identity,
            page_cache_max_age_secs,
            shell: ShellConfig::from_env(),
        })
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

/// Parse a supported identity-token algorithm.
fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match value.trim() {
        "EdDSA" => Ok(Algorithm::EdDSA),
        "RS256" => Ok(Algorithm::RS256),
        other => Err(ConfigError::InvalidValue {
            name: "JWT_ALGORITHM".to_string(),
            reason: format!("unsupported algorithm '{}', expected EdDSA or RS256", other),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
