//! Token issuance handler.

use crate::errors::TsError;
use crate::models::{TokenQuery, TokenResponse};
use crate::observability::metrics::{record_token_issuance_failure, record_token_issued};
use crate::routes::AppState;
use crate::services::token_service;
use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Handle an access token request.
///
/// GET /token?room=<room>&username=<identity>
///
/// Both query parameters are optional. Fails closed with 500 and no token
/// when the media-server secrets are not configured.
#[instrument(skip_all, name = "ts.handlers.token")]
pub async fn handle_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, TsError> {
    let start = Instant::now();

    let Some(issuer) = state.issuer.as_ref() else {
        record_token_issuance_failure("configuration");
        return Err(TsError::Configuration(
            state.config.missing_secrets().join(", "),
        ));
    };

    let credential = token_service::issue_token(
        issuer,
        query.room.as_deref(),
        query.username.as_deref(),
    )
    .inspect_err(|e| record_token_issuance_failure(e.reason()))?;

    record_token_issued(start.elapsed());

    Ok(Json(TokenResponse {
        access_token: credential.access_token,
        url: credential.server_url,
    }))
}
