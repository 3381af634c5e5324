//! Token Service Library
//!
//! Issues short-lived access tokens that let a browser session join a media
//! room. A token grants join, publish and subscribe for exactly one room and
//! is returned together with the media-server URL.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/token_service.rs -> crypto
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `crypto` - HS256 token signing
//! - `errors` - Error types with HTTP response mapping
//! - `handlers` - HTTP request handlers
//! - `models` - Request/response models
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Token issuance

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
