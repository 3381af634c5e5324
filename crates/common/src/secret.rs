//! Secret types for values that must never reach a log line.
//!
//! Re-exports [`secrecy`]'s `SecretString`. Its `Debug` impl prints a
//! redaction marker, so any struct deriving `Debug` that holds one is safe
//! to pass to `tracing`. The inner value is zeroized on drop and is only
//! reachable through an explicit `expose_secret()` call.
//!
//! Use `SecretString` for:
//! - The media-server API secret (`LIVEKIT_API_SECRET`)
//! - Access tokens held by the session controller
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Credential {
//!     url: String,
//!     access_token: SecretString,
//! }
//!
//! let credential = Credential {
//!     url: "wss://media.example".to_string(),
//!     access_token: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! assert!(!format!("{credential:?}").contains("eyJhbGciOi"));
//! assert_eq!(credential.access_token.expose_secret(), "eyJhbGciOi...");
//! ```

pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_owned_string_conversion() {
        let raw = String::from("eyJ.payload.sig");
        let secret = SecretString::from(raw);

        assert_eq!(secret.expose_secret(), "eyJ.payload.sig");
        assert!(!format!("{secret:?}").contains("eyJ.payload.sig"));
    }

    #[test]
    fn test_clone_keeps_value() {
        let secret = SecretString::from("cloneable");
        let cloned = secret.clone();
        assert_eq!(cloned.expose_secret(), "cloneable");
    }
}
