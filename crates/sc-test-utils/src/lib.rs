//! # SC Test Utilities
//!
//! Shared test utilities for the Session Controller (SC).
//!
//! This crate provides mock implementations of every collaborator the
//! controller talks to, so the actor can be driven without a browser, a
//! media server or a token endpoint.
//!
//! ## Modules
//!
//! - `mock_platform` - Permission source, media devices and preview tracks
//! - `mock_room` - Room connector and session with event injection
//! - `mock_credentials` - Credential source with gating and scripted failures
//! - `harness` - `MockPlatform` bundle and snapshot wait helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let platform = MockPlatform::granted();
//!     let (handle, _task) = platform.spawn();
//!
//!     handle.mount().await.unwrap();
//!     wait_for(&handle, |s| s.preview_active).await;
//!
//!     // At most one device owner at any time
//!     assert!(platform.ledger.max_holders() <= 1);
//! }
//! ```

pub mod harness;
pub mod mock_credentials;
pub mod mock_platform;
pub mod mock_room;

// Re-export commonly used items
pub use harness::*;
pub use mock_credentials::*;
pub use mock_platform::*;
pub use mock_room::*;
