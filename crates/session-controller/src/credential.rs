//! Room credentials and the HTTP client that fetches them.
//!
//! A [`Credential`] is created per connect attempt, held only while the
//! attempt or the call is live, and never persisted.

use crate::config::SessionConfig;
use crate::errors::{SessionError, TokenFetchError};
use async_trait::async_trait;
use common::jwt::{extract_claims_unverified, AccessClaims, JwtValidationError};
use common::secret::{ExposeSecret, SecretString};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Connect timeout for the token endpoint.
const TOKEN_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Access token plus the media-server address it is valid for.
#[derive(Clone)]
pub struct Credential {
    pub access_token: SecretString,
    pub url: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            url: url.into(),
        }
    }

    /// Decode the token's claims without verifying them.
    ///
    /// For display and logging only; the media server does the verification.
    ///
    /// # Errors
    ///
    /// `JwtValidationError` if the token is not a well-formed JWT.
    pub fn claims(&self) -> Result<AccessClaims, JwtValidationError> {
        extract_claims_unverified(self.access_token.expose_secret())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("url", &self.url)
            .finish()
    }
}

/// Source of room credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch a fresh credential for `username` in `room`.
    ///
    /// # Errors
    ///
    /// `TokenFetchError` on transport failure, non-success status or a
    /// malformed body.
    async fn fetch(&self, room: &str, username: &str) -> Result<Credential, TokenFetchError>;
}

/// Wire shape of a successful token response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    access_token: String,
    url: String,
}

/// HTTP client for the token endpoint.
#[derive(Clone)]
pub struct TokenClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Full URL of the token endpoint.
    endpoint: String,
}

impl TokenClient {
    /// Create a client for the endpoint in `config`.
    ///
    /// # Errors
    ///
    /// `SessionError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(TOKEN_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                error!(target: "sc.token_client", error = %e, "Failed to build HTTP client");
                SessionError::HttpClient(e.to_string())
            })?;

        Ok(Self {
            client,
            endpoint: config.token_endpoint.clone(),
        })
    }
}

#[async_trait]
impl CredentialSource for TokenClient {
    #[instrument(skip_all, name = "sc.token_client.fetch", fields(room = %room))]
    async fn fetch(&self, room: &str, username: &str) -> Result<Credential, TokenFetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("room", room), ("username", username)])
            .send()
            .await
            .map_err(|e| {
                warn!(target: "sc.token_client", error = %e, "Token request failed");
                TokenFetchError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            warn!(target: "sc.token_client", status = %status, "Token endpoint returned error status");
            return Err(TokenFetchError::Status {
                status: status.as_u16(),
                status_text,
            });
        }

        let body: TokenBody = response.json().await.map_err(|e| {
            warn!(target: "sc.token_client", error = %e, "Failed to parse token response");
            TokenFetchError::InvalidResponse(e.to_string())
        })?;

        let credential = Credential::new(body.access_token, body.url);

        match credential.claims() {
            Ok(claims) => debug!(
                target: "sc.token_client",
                expires_at = claims.exp,
                "Credential received"
            ),
            Err(e) => debug!(target: "sc.token_client", error = %e, "Credential token is opaque"),
        }

        Ok(credential)
    }
}
