//! Liveness endpoint.
//!
//! Reports process liveness only. Missing media-server secrets do not make
//! the service unhealthy; they make `/token` answer 500.

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
