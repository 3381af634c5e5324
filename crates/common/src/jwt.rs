//! Access token claims shared by the token service and its clients.
//!
//! Access tokens are HS256 JWTs in the format the media server expects:
//! the API key is the issuer, the participant identity is the subject, and
//! room capabilities live under the `video` claim as a [`VideoGrant`].
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only HS256 is accepted on verification
//! - `sub` and `name` are redacted in Debug output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{verify_access_token, MAX_JWT_SIZE_BYTES};
//!
//! let claims = verify_access_token(&token, "api-key", &api_secret)?;
//! assert!(claims.video.allows_room("room-01"));
//! ```

use crate::secret::{ExposeSecret, SecretString};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted token size in bytes (8KB).
///
/// Checked before base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading an access token.
///
/// Messages are intentionally generic; details go to debug logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Signature, issuer or expiry check failed.
    #[error("The access token is invalid or expired")]
    VerificationFailed,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Room capabilities embedded in an access token.
///
/// Only the grants this platform issues are modelled as booleans; the
/// administrative grants exist so that verification can assert they are
/// never present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    /// Permission to join a room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_join: Option<bool>,

    /// The single room this grant applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    /// Permission to publish tracks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish: Option<bool>,

    /// Permission to subscribe to other participants' tracks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_subscribe: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_admin: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_create: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_list: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_record: Option<bool>,
}

impl VideoGrant {
    /// Participant grant: join `room`, publish and subscribe. Nothing else.
    #[must_use]
    pub fn participant(room: impl Into<String>) -> Self {
        Self {
            room_join: Some(true),
            room: Some(room.into()),
            can_publish: Some(true),
            can_subscribe: Some(true),
            ..Self::default()
        }
    }

    /// True if this grant lets a participant join exactly `room`.
    #[must_use]
    pub fn allows_room(&self, room: &str) -> bool {
        self.room_join == Some(true) && self.room.as_deref() == Some(room)
    }

    /// True if any administrative or moderation grant is set.
    #[must_use]
    pub fn has_admin_grants(&self) -> bool {
        [
            self.room_admin,
            self.room_create,
            self.room_list,
            self.room_record,
        ]
        .iter()
        .any(|grant| *grant == Some(true))
    }
}

/// Access token claims.
///
/// `sub` and `name` carry the participant identity and are redacted in
/// Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer: the API key the token was signed for.
    pub iss: String,

    /// Subject: participant identity. Redacted in Debug output.
    pub sub: String,

    /// Display name. Redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Unique token id. Every issued token gets a fresh one.
    pub jti: String,

    /// Room capabilities.
    pub video: VideoGrant,
}

impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("name", &self.name.as_ref().map(|_| "[REDACTED]"))
            .field("nbf", &self.nbf)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("jti", &self.jti)
            .field("video", &self.video)
            .finish()
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Verify an access token's signature, issuer and expiry.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `VerificationFailed` - bad signature, wrong issuer, expired or not yet valid
pub fn verify_access_token(
    token: &str,
    api_key: &str,
    api_secret: &SecretString,
) -> Result<AccessClaims, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let decoding_key = DecodingKey::from_secret(api_secret.expose_secret().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_issuer(&[api_key]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

    let token_data = decode::<AccessClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Token verification failed");
        JwtValidationError::VerificationFailed
    })?;

    Ok(token_data.claims)
}

/// Read the claims of an access token WITHOUT verifying its signature.
///
/// Clients never hold the API secret; they use this to inspect the room and
/// expiry of a token they were handed. Never use the result for
/// authorization decisions.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - not three segments, bad base64 or bad JSON
pub fn extract_claims_unverified(token: &str) -> Result<AccessClaims, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    let payload_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT payload base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&payload_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT payload JSON");
        JwtValidationError::MalformedToken
    })
}
