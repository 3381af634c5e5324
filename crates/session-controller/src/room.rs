//! Media room collaborator.
//!
//! The real-time transport lives behind [`RoomConnector`]. Joining yields a
//! [`RoomSession`] for in-call controls plus a stream of [`RoomEvent`]s the
//! controller watches for disconnects and transport errors.

use crate::errors::TransportError;
use async_trait::async_trait;
use common::secret::SecretString;
use tokio::sync::mpsc;

/// Everything the transport needs to join a room.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub token: SecretString,
    pub server_url: String,
    pub audio: bool,
    pub video: bool,
}

/// Room conditions the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// The room is gone, for any reason.
    Disconnected,
    /// The transport reported an error.
    Error(String),
}

/// A joined room.
pub struct JoinedRoom {
    pub session: Box<dyn RoomSession>,
    pub events: mpsc::Receiver<RoomEvent>,
}

/// Joins media rooms.
#[async_trait]
pub trait RoomConnector: Send + Sync {
    /// Join with the given credential and media settings.
    ///
    /// # Errors
    ///
    /// `TransportError::Join` if the room could not be joined.
    async fn join(&self, request: JoinRequest) -> Result<JoinedRoom, TransportError>;
}

/// Controls for a joined room. Mute state is owned here, never mirrored.
#[async_trait]
pub trait RoomSession: Send + Sync {
    /// Leave the room and release its devices.
    async fn disconnect(&self);

    /// # Errors
    ///
    /// `TransportError::Control` if the track could not be toggled.
    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), TransportError>;

    /// # Errors
    ///
    /// `TransportError::Control` if the track could not be toggled.
    async fn set_camera_enabled(&self, enabled: bool) -> Result<(), TransportError>;

    fn is_microphone_enabled(&self) -> bool;

    fn is_camera_enabled(&self) -> bool;
}

/// Exclusive owner of a joined room's session.
pub struct RoomGuard {
    session: Box<dyn RoomSession>,
}

impl RoomGuard {
    pub fn new(session: Box<dyn RoomSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &dyn RoomSession {
        self.session.as_ref()
    }

    /// Leave the room, consuming the guard.
    pub async fn disconnect(self) {
        self.session.disconnect().await;
    }
}
