//! The published session snapshot.
//!
//! One value describes everything a UI needs: permission, connection,
//! preview, in-call device state and the current user-facing notice.

use crate::permission::PermissionState;
use serde::{Deserialize, Serialize};

/// Remediation shown while camera/microphone access is blocked.
pub const PERMISSION_BLOCKED_MESSAGE: &str =
    "Camera/Microphone access is blocked. Please reset permissions in your browser address bar.";

/// Connection lifecycle. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
}

/// Dismissable user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Notice {
    /// Device access is blocked; connect is disabled.
    PermissionBlocked,
    /// The token endpoint failed. Holds the full message.
    TokenFetchFailed(String),
    /// The room reported a transport error. Holds the bare error.
    RoomError(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::PermissionBlocked => PERMISSION_BLOCKED_MESSAGE.to_string(),
            Notice::TokenFetchFailed(message) => message.clone(),
            Notice::RoomError(message) => format!("Room error: {message}"),
        }
    }
}

/// Authoritative view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub permission: PermissionState,
    pub connection: ConnectionState,
    /// A local preview track is live.
    pub preview_active: bool,
    /// Surface the preview is rendered into.
    pub preview_surface: Option<String>,
    /// A credential is held for the current attempt or call.
    pub has_credential: bool,
    /// Read back from the room; `None` outside a call.
    pub microphone_enabled: Option<bool>,
    /// Read back from the room; `None` outside a call.
    pub camera_enabled: Option<bool>,
    pub notice: Option<Notice>,
}

impl SessionSnapshot {
    /// Connect is offered only when idle and not blocked.
    pub fn can_connect(&self) -> bool {
        self.connection == ConnectionState::Idle && self.permission != PermissionState::Denied
    }

    pub fn is_connecting(&self) -> bool {
        self.connection == ConnectionState::Connecting
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn notice_message(&self) -> Option<String> {
        self.notice.as_ref().map(Notice::message)
    }

    /// Remediation text while access is blocked.
    pub fn remediation(&self) -> Option<&'static str> {
        (self.permission == PermissionState::Denied).then_some(PERMISSION_BLOCKED_MESSAGE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_can_connect() {
        let snapshot = SessionSnapshot::default();

        assert_eq!(snapshot.permission, PermissionState::Unknown);
        assert!(snapshot.can_connect());
        assert!(!snapshot.is_connecting());
        assert_eq!(snapshot.remediation(), None);
    }

    #[test]
    fn test_denied_blocks_connect_and_offers_remediation() {
        let snapshot = SessionSnapshot {
            permission: PermissionState::Denied,
            ..SessionSnapshot::default()
        };

        assert!(!snapshot.can_connect());
        assert_eq!(snapshot.remediation(), Some(PERMISSION_BLOCKED_MESSAGE));
    }

    #[test]
    fn test_connecting_blocks_connect() {
        let snapshot = SessionSnapshot {
            connection: ConnectionState::Connecting,
            ..SessionSnapshot::default()
        };

        assert!(snapshot.is_connecting());
        assert!(!snapshot.can_connect());
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(
            Notice::RoomError("ice failed".to_string()).message(),
            "Room error: ice failed"
        );
        assert_eq!(
            Notice::TokenFetchFailed("Failed to fetch token: Bad Gateway".to_string()).message(),
            "Failed to fetch token: Bad Gateway"
        );
        assert_eq!(Notice::PermissionBlocked.message(), PERMISSION_BLOCKED_MESSAGE);
    }

    #[test]
    fn test_snapshot_serializes_lowercase_states() {
        let snapshot = SessionSnapshot {
            permission: PermissionState::Granted,
            connection: ConnectionState::Connected,
            notice: Some(Notice::RoomError("x".to_string())),
            ..SessionSnapshot::default()
        };

        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["permission"], "granted");
        assert_eq!(json["connection"], "connected");
        assert_eq!(json["notice"]["kind"], "room_error");
    }
}
