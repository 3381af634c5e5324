//! Access token issuance.
//!
//! Mints HS256 tokens granting join, publish and subscribe for a single room.
//! Tokens are stateless: nothing is stored, and every request signs a new
//! token with a fresh `jti`.

use crate::config::{Config, ConfigError};
use crate::crypto;
use crate::errors::TsError;
use common::jwt::{AccessClaims, VideoGrant};
use common::secret::SecretString;
use chrono::Utc;
use rand::Rng;
use std::fmt;
use tracing::instrument;

/// Prefix of generated guest identities.
pub const GUEST_IDENTITY_PREFIX: &str = "user-";

/// Exclusive upper bound of the random guest suffix.
const GUEST_SUFFIX_RANGE: u32 = 10_000;

/// Signs access tokens for one media server.
///
/// Built once from [`Config`]; construction is where the three secrets are
/// validated. Holding a `TokenIssuer` means issuance cannot fail for lack of
/// configuration.
#[derive(Clone)]
pub struct TokenIssuer {
    api_key: String,
    api_secret: SecretString,
    server_url: String,
    default_room: String,
    ttl_seconds: i64,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .field("default_room", &self.default_room)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenIssuer {
    /// Validate the media-server secrets in `config`.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingEnvVar` naming every absent secret.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match (&config.api_key, &config.api_secret, &config.server_url) {
            (Some(api_key), Some(api_secret), Some(server_url)) => Ok(Self {
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
                server_url: server_url.clone(),
                default_room: config.default_room.clone(),
                ttl_seconds: config.token_ttl_seconds,
            }),
            _ => Err(ConfigError::MissingEnvVar(
                config.missing_secrets().join(", "),
            )),
        }
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }
}

/// A freshly minted credential for one participant in one room.
#[derive(Clone)]
pub struct IssuedCredential {
    pub access_token: String,
    pub server_url: String,
    pub room: String,
    pub identity: String,
    pub expires_at: i64,
}

impl fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredential")
            .field("access_token", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .field("room", &self.room)
            .field("identity", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Random guest identity, `user-<0..9999>`.
pub fn guest_identity() -> String {
    let suffix = rand::thread_rng().gen_range(0..GUEST_SUFFIX_RANGE);
    format!("{GUEST_IDENTITY_PREFIX}{suffix}")
}

/// Issue an access token for `identity` in `room`.
///
/// Absent or empty inputs fall back to the issuer's default room and a random
/// guest identity. Every call signs a new token with a fresh `jti`; nothing is
/// cached. The grant is join + publish + subscribe for exactly that room.
///
/// # Errors
///
/// `TsError::Crypto` if signing fails.
#[instrument(skip_all, fields(room = tracing::field::Empty))]
pub fn issue_token(
    issuer: &TokenIssuer,
    room: Option<&str>,
    identity: Option<&str>,
) -> Result<IssuedCredential, TsError> {
    let room = room
        .filter(|r| !r.is_empty())
        .unwrap_or(issuer.default_room())
        .to_string();
    let identity = identity
        .filter(|i| !i.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(guest_identity);

    tracing::Span::current().record("room", room.as_str());

    let now = Utc::now().timestamp();
    let claims = AccessClaims {
        iss: issuer.api_key.clone(),
        sub: identity.clone(),
        name: Some(identity.clone()),
        nbf: now,
        iat: now,
        exp: now + issuer.ttl_seconds,
        jti: crypto::generate_token_id(),
        video: VideoGrant::participant(room.clone()),
    };

    let access_token = crypto::sign_access_token(&claims, &issuer.api_secret)?;

    tracing::debug!(
        target: "ts.services.token",
        room = %room,
        expires_at = claims.exp,
        "Access token issued"
    );

    Ok(IssuedCredential {
        access_token,
        server_url: issuer.server_url.clone(),
        room,
        identity,
        expires_at: claims.exp,
    })
}
