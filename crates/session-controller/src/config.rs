//! Session Controller configuration.
//!
//! Built explicitly by the embedding application; there is no environment
//! lookup on the client side.

use crate::media::Resolution;
use std::time::Duration;

/// Token endpoint used when none is configured.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "http://localhost:3000/api/token";

/// Room joined when none is configured.
pub const DEFAULT_ROOM: &str = "room-01";

/// Participant name sent with token requests.
pub const DEFAULT_USERNAME: &str = "user";

/// Default token request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Session Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Full URL of the token endpoint.
    pub token_endpoint: String,

    /// Room to join.
    pub room: String,

    /// Participant name to request a token for.
    pub username: String,

    /// Local preview capture resolution.
    pub preview_resolution: Resolution,

    /// Total timeout for one token request.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            room: DEFAULT_ROOM.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            preview_resolution: Resolution::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}
