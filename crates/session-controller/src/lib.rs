//! Session Controller Library
//!
//! Client-side state for a coaching video session: camera/microphone
//! permission, the local preview, and the connect/disconnect lifecycle of a
//! media room.
//!
//! # Architecture
//!
//! A single actor task ([`controller::SessionController`]) owns all state and
//! publishes a [`state::SessionSnapshot`] on a watch channel. Platform and
//! service access goes through traits so the controller runs unchanged
//! against a browser bridge, a native SDK or test mocks:
//!
//! - [`permission::PermissionSource`] - permission status and change notifications
//! - [`media::MediaDevices`] - local preview capture
//! - [`room::RoomConnector`] - media room join and in-call controls
//! - [`credential::CredentialSource`] - room credentials ([`credential::TokenClient`] over HTTP)
//!
//! # Example
//!
//! ```rust,ignore
//! let (handle, _task) = SessionController::spawn(config, collaborators, CancellationToken::new());
//! handle.mount().await?;
//! handle.attach_preview("preview").await?;
//! handle.connect().await?;
//! ```

pub mod config;
pub mod controller;
pub mod credential;
pub mod errors;
pub mod media;
pub mod permission;
pub mod room;
pub mod state;

pub use config::SessionConfig;
pub use controller::{Collaborators, ConnectAttempt, SessionController, SessionHandle};
pub use credential::{Credential, CredentialSource, TokenClient};
pub use errors::{AcquireError, PlatformError, SessionError, TokenFetchError, TransportError};
pub use permission::{DevicePermission, PermissionState, PermissionStatus};
pub use state::{ConnectionState, Notice, SessionSnapshot};
