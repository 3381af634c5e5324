use crate::errors::TsError;
use common::jwt::AccessClaims;
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tracing::instrument;

/// Sign access token claims with the media-server API secret (HS256).
#[instrument(skip_all)]
pub fn sign_access_token(claims: &AccessClaims, api_secret: &SecretString) -> Result<String, TsError> {
    let encoding_key = EncodingKey::from_secret(api_secret.expose_secret().as_bytes());

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &encoding_key)
        .map_err(|e| TsError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Generate a unique token id.
pub fn generate_token_id() -> String {
    format!("TK_{}", uuid::Uuid::new_v4().simple())
}
