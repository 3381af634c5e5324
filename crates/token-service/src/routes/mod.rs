//! HTTP routes for the Token Service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::token_service::TokenIssuer;
use axum::http::{HeaderValue, Method};
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Present only when every media-server secret is configured.
    pub issuer: Option<TokenIssuer>,
}

impl AppState {
    /// Build state from `config`, validating the media-server secrets once.
    ///
    /// Missing secrets are logged and leave `issuer` empty; the token
    /// endpoint then fails closed on every request.
    pub fn new(config: Config) -> Self {
        let issuer = match TokenIssuer::from_config(&config) {
            Ok(issuer) => Some(issuer),
            Err(e) => {
                tracing::warn!(
                    target: "ts.config",
                    error = %e,
                    "Media server secrets not configured; token requests will fail"
                );
                None
            }
        };

        Self { config, issuer }
    }
}

/// Build the application routes.
///
/// - `/token` and `/api/token` - access token issuance
/// - `/health` - liveness
/// - `/metrics` - Prometheus scrape (only when a handle is supplied)
pub fn build_routes(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    let mut app = Router::new()
        .route("/token", get(handlers::handle_token))
        .route("/api/token", get(handlers::handle_token))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    if let Some(handle) = metrics_handle {
        let metrics_routes = Router::new()
            .route("/metrics", get(handlers::metrics_handler))
            .with_state(handle);
        app = app.merge(metrics_routes);
    }

    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer
    // 2. TraceLayer
    // 3. HTTP metrics (outermost, sees every response)
    app.layer(TimeoutLayer::new(Duration::from_secs(10)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}

fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    match origin.parse::<HeaderValue>() {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods([Method::GET]),
        ),
        Err(e) => {
            tracing::warn!(target: "ts.config", error = %e, "Ignoring invalid CORS origin");
            None
        }
    }
}
