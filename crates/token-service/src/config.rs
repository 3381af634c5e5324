//! Token Service configuration.
//!
//! Configuration is loaded from environment variables. The three media-server
//! secrets are optional at load time: a missing secret does not stop the
//! process from starting, it makes the token endpoint fail closed at request
//! time. The API secret is redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Environment variable holding the media-server API key.
pub const API_KEY_VAR: &str = "LIVEKIT_API_KEY";

/// Environment variable holding the media-server API secret.
pub const API_SECRET_VAR: &str = "LIVEKIT_API_SECRET";

/// Environment variable holding the media-server connection URL.
pub const SERVER_URL_VAR: &str = "LIVEKIT_URL";

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Room used when a request does not name one.
pub const DEFAULT_ROOM: &str = "room-01";

/// Default access token lifetime (6 hours).
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 6 * 60 * 60;

/// Upper bound on the access token lifetime (24 hours).
pub const MAX_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Token Service configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Media-server API key. Used as the token issuer.
    pub api_key: Option<String>,

    /// Media-server API secret. Signs the tokens.
    pub api_secret: Option<SecretString>,

    /// Media-server URL handed to clients alongside the token.
    pub server_url: Option<String>,

    /// Room name used when the request omits one.
    pub default_room: String,

    /// Lifetime of issued tokens in seconds.
    pub token_ttl_seconds: i64,

    /// Browser origin allowed to call the endpoint cross-origin.
    pub cors_allowed_origin: Option<String>,

    /// Seconds to keep serving in-flight requests after a shutdown signal.
    pub drain_seconds: u64,
}

/// Custom Debug implementation that redacts the API secret.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("server_url", &self.server_url)
            .field("default_room", &self.default_room)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("cors_allowed_origin", &self.cors_allowed_origin)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // Empty values count as unset
        let api_key = non_empty(vars, API_KEY_VAR);
        let api_secret = non_empty(vars, API_SECRET_VAR).map(SecretString::from);
        let server_url = non_empty(vars, SERVER_URL_VAR);

        let default_room =
            non_empty(vars, "DEFAULT_ROOM").unwrap_or_else(|| DEFAULT_ROOM.to_string());

        let token_ttl_seconds = if let Some(value_str) = vars.get("TOKEN_TTL_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be positive, got {}",
                    value
                )));
            }

            if value > MAX_TOKEN_TTL_SECONDS {
                return Err(ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must not exceed {} seconds, got {}",
                    MAX_TOKEN_TTL_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_TOKEN_TTL_SECONDS
        };

        let cors_allowed_origin = non_empty(vars, "CORS_ALLOWED_ORIGIN");

        let drain_seconds = match vars.get("DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?,
            None => 0,
        };

        Ok(Config {
            bind_address,
            api_key,
            api_secret,
            server_url,
            default_room,
            token_ttl_seconds,
            cors_allowed_origin,
            drain_seconds,
        })
    }

    /// Names of the media-server secrets that are not configured.
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_none() {
            missing.push(API_KEY_VAR);
        }
        if self.api_secret.is_none() {
            missing.push(API_SECRET_VAR);
        }
        if self.server_url.is_none() {
            missing.push(SERVER_URL_VAR);
        }
        missing
    }
}

fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
