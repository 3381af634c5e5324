//! Token Service error types.
//!
//! Every variant maps to a 500 response with a flat `{"error": "..."}` body,
//! the shape the browser client reads. Internal details are logged
//! server-side and never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned when the media-server secrets are not configured.
pub const MISSING_CONFIGURATION_MESSAGE: &str = "Missing environment variables";

#[derive(Debug, Error)]
pub enum TsError {
    /// One or more media-server secrets are absent. Operator-fixable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),
}

impl TsError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TsError::Configuration(_) | TsError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Bounded label for failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            TsError::Configuration(_) => "configuration",
            TsError::Crypto(_) => "crypto",
        }
    }
}

/// Error body returned to clients. Never carries an `accessToken`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for TsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            TsError::Configuration(detail) => {
                tracing::error!(target: "ts.config", detail = %detail, "Token requested without configured secrets");
                MISSING_CONFIGURATION_MESSAGE.to_string()
            }
            TsError::Crypto(detail) => {
                tracing::error!(target: "ts.crypto", detail = %detail, "Token signing failed");
                "Failed to sign access token".to_string()
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: TsError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_configuration_error_response() {
        let (status, body) =
            body_json(TsError::Configuration("LIVEKIT_URL".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], MISSING_CONFIGURATION_MESSAGE);
        assert!(body.get("accessToken").is_none());
    }

    #[tokio::test]
    async fn test_crypto_error_hides_detail() {
        let (status, body) = body_json(TsError::Crypto("InvalidKeyFormat".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to sign access token");
        assert!(!body.to_string().contains("InvalidKeyFormat"));
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(TsError::Configuration(String::new()).reason(), "configuration");
        assert_eq!(TsError::Crypto(String::new()).reason(), "crypto");
    }
}
