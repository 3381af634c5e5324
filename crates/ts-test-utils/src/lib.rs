//! # TS Test Utilities
//!
//! Shared test utilities for the Token Service (TS).
//!
//! This crate provides:
//! - Server test harness (`TestTokenServer` for E2E tests)
//! - Well-known test credentials
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ts_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestTokenServer::spawn_configured().await?;
//!
//!     let response = reqwest::get(format!("{}/token?room=room-01", server.url())).await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;

// Re-export commonly used items
pub use server_harness::*;
