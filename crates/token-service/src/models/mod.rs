//! Request and response models for the token endpoint.

use serde::{Deserialize, Serialize};

/// Query string of `GET /token`. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub room: Option<String>,
    pub username: Option<String>,
}

/// Successful token response.
///
/// The token is a bearer credential for the room; Debug redacts it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub url: String,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("url", &self.url)
            .finish()
    }
}
