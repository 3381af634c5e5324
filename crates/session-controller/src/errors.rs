//! Session Controller error types.
//!
//! Every failure a collaborator can report is caught inside the controller
//! and folded into the published snapshot. `SessionError` is what the
//! handle itself returns to callers.

use thiserror::Error;

/// Error name a browser-style platform uses for a refused device request.
pub const NOT_ALLOWED_ERROR_NAME: &str = "NotAllowedError";

/// Message fragment some platforms use for a refused device request.
pub const PERMISSION_DENIED_FRAGMENT: &str = "Permission denied";

/// Errors returned by `SessionHandle` methods.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The controller task has exited.
    #[error("Session controller is not running")]
    ControllerClosed,

    /// The operation needs a live room.
    #[error("Not connected to a room")]
    NotConnected,

    /// A room control call failed.
    #[error("Room error: {0}")]
    Transport(#[from] TransportError),

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Local device acquisition failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AcquireError {
    /// The user or platform refused camera/microphone access.
    #[error("Device access denied: {0}")]
    PermissionDenied(String),

    /// Any other failure (device busy, missing hardware, ...).
    #[error("Device unavailable: {0}")]
    Unavailable(String),
}

impl AcquireError {
    /// Classify a platform failure by its error name and message.
    ///
    /// A `NotAllowedError` name or a message containing "Permission denied"
    /// means the user refused access; everything else is transient.
    pub fn classify(name: &str, message: &str) -> Self {
        if name == NOT_ALLOWED_ERROR_NAME || message.contains(PERMISSION_DENIED_FRAGMENT) {
            AcquireError::PermissionDenied(message.to_string())
        } else {
            AcquireError::Unavailable(message.to_string())
        }
    }

    /// Whether this failure means access was refused.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AcquireError::PermissionDenied(_))
    }
}

/// Platform capability failure (permission query, display surface).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The platform does not offer the capability.
    #[error("Platform capability unsupported: {0}")]
    Unsupported(String),

    /// The capability exists but the call failed.
    #[error("Platform call failed: {0}")]
    Failed(String),
}

/// Media transport failure reported by the room.
///
/// Displays as the bare message so it can be prefixed for the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Joining the room failed.
    #[error("{0}")]
    Join(String),

    /// A call on a joined room failed.
    #[error("{0}")]
    Control(String),
}

/// Token endpoint failure. Display is the user-facing message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenFetchError {
    /// The endpoint answered with a non-success status.
    #[error("Failed to fetch token: {status_text}")]
    Status { status: u16, status_text: String },

    /// The request never produced a response.
    #[error("Failed to fetch token: {0}")]
    Network(String),

    /// The response body was not a credential.
    #[error("Failed to fetch token: invalid response ({0})")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_allowed_name() {
        let err = AcquireError::classify("NotAllowedError", "The request is not allowed");
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_classify_permission_denied_message() {
        let err = AcquireError::classify("Error", "Permission denied by system");
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_classify_other_failures_are_transient() {
        let err = AcquireError::classify("NotReadableError", "Could not start video source");
        assert_eq!(
            err,
            AcquireError::Unavailable("Could not start video source".to_string())
        );
        assert!(!err.is_permission_denied());
    }

    #[test]
    fn test_token_fetch_error_messages() {
        let status = TokenFetchError::Status {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        };
        assert_eq!(
            status.to_string(),
            "Failed to fetch token: Internal Server Error"
        );

        let network = TokenFetchError::Network("connection refused".to_string());
        assert_eq!(network.to_string(), "Failed to fetch token: connection refused");
    }

    #[test]
    fn test_transport_error_displays_bare_message() {
        let err = TransportError::Join("signal timeout".to_string());
        assert_eq!(err.to_string(), "signal timeout");

        let session_err = SessionError::from(TransportError::Control("track gone".to_string()));
        assert_eq!(session_err.to_string(), "Room error: track gone");
    }
}
