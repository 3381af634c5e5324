//! Local media devices and exclusive device ownership.
//!
//! The physical camera/microphone is held by at most one owner: the local
//! preview while idle, or the room once connected. [`DeviceOwner`] is the
//! single field that records who holds it, so two owners cannot be
//! represented.

use crate::errors::{AcquireError, PlatformError};
use crate::room::RoomGuard;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Capture resolution requested for the local preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 1280x720.
    pub const HD: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD
    }
}

/// A live local capture track.
///
/// `stop` releases the device and must be safe to call more than once.
pub trait PreviewTrack: Send + Sync {
    /// Release the underlying device.
    fn stop(&self);

    /// Render the track into a named display surface.
    ///
    /// # Errors
    ///
    /// `PlatformError` if the surface cannot be found or bound.
    fn attach(&self, surface: &str) -> Result<(), PlatformError>;

    /// Detach from whatever surface the track is rendered into.
    fn detach(&self);
}

/// Platform access to local capture devices.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Open the camera and microphone for a local preview.
    ///
    /// # Errors
    ///
    /// `AcquireError::PermissionDenied` when access is refused,
    /// `AcquireError::Unavailable` otherwise.
    async fn acquire_preview(
        &self,
        resolution: Resolution,
    ) -> Result<Box<dyn PreviewTrack>, AcquireError>;
}

/// Exclusive owner of a preview track. Detaches and stops it on drop.
pub struct PreviewGuard {
    track: Box<dyn PreviewTrack>,
    surface: Option<String>,
}

impl PreviewGuard {
    pub fn new(track: Box<dyn PreviewTrack>) -> Self {
        Self {
            track,
            surface: None,
        }
    }

    /// Attach to `surface`, detaching from any previous one first.
    ///
    /// # Errors
    ///
    /// `PlatformError` from the track; the guard is left detached.
    pub fn attach(&mut self, surface: &str) -> Result<(), PlatformError> {
        self.detach();
        self.track.attach(surface)?;
        self.surface = Some(surface.to_string());
        Ok(())
    }

    pub fn detach(&mut self) {
        if self.surface.take().is_some() {
            self.track.detach();
        }
    }

    pub fn surface(&self) -> Option<&str> {
        self.surface.as_deref()
    }
}

impl Drop for PreviewGuard {
    fn drop(&mut self) {
        self.detach();
        self.track.stop();
        debug!(target: "sc.media", "Preview track stopped");
    }
}

/// Who currently holds the physical devices.
#[derive(Default)]
pub(crate) enum DeviceOwner {
    #[default]
    None,
    Preview(PreviewGuard),
    Room(RoomGuard),
}

impl DeviceOwner {
    pub(crate) fn is_none(&self) -> bool {
        matches!(self, DeviceOwner::None)
    }

    pub(crate) fn preview(&self) -> Option<&PreviewGuard> {
        match self {
            DeviceOwner::Preview(guard) => Some(guard),
            _ => None,
        }
    }

    pub(crate) fn preview_mut(&mut self) -> Option<&mut PreviewGuard> {
        match self {
            DeviceOwner::Preview(guard) => Some(guard),
            _ => None,
        }
    }

    pub(crate) fn room(&self) -> Option<&RoomGuard> {
        match self {
            DeviceOwner::Room(guard) => Some(guard),
            _ => None,
        }
    }

    /// Drop a held preview. A room owner is left in place.
    pub(crate) fn release_preview(&mut self) -> bool {
        if matches!(self, DeviceOwner::Preview(_)) {
            *self = DeviceOwner::None;
            return true;
        }
        false
    }

    /// Take a held room, leaving no owner.
    pub(crate) fn take_room(&mut self) -> Option<RoomGuard> {
        match std::mem::take(self) {
            DeviceOwner::Room(guard) => Some(guard),
            other => {
                *self = other;
                None
            }
        }
    }
}

/// Attach `guard` to `surface`, logging instead of failing.
pub(crate) fn attach_or_warn(guard: &mut PreviewGuard, surface: &str) {
    if let Err(e) = guard.attach(surface) {
        warn!(target: "sc.media", error = %e, surface = %surface, "Failed to attach preview");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        stops: AtomicUsize,
        detaches: AtomicUsize,
        attached: Mutex<Vec<String>>,
    }

    struct RecordingTrack(Arc<Calls>);

    impl PreviewTrack for RecordingTrack {
        fn stop(&self) {
            self.0.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn attach(&self, surface: &str) -> Result<(), PlatformError> {
            if surface.is_empty() {
                return Err(PlatformError::Failed("no such surface".to_string()));
            }
            self.0.attached.lock().unwrap().push(surface.to_string());
            Ok(())
        }

        fn detach(&self) {
            self.0.detaches.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn guard() -> (PreviewGuard, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        (PreviewGuard::new(Box::new(RecordingTrack(calls.clone()))), calls)
    }

    #[test]
    fn test_default_resolution_is_hd() {
        assert_eq!(Resolution::default(), Resolution { width: 1280, height: 720 });
    }

    #[test]
    fn test_drop_stops_track() {
        let (guard, calls) = guard();
        drop(guard);
        assert_eq!(calls.stops.load(Ordering::SeqCst), 1);
        assert_eq!(calls.detaches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_detaches_before_stopping() {
        let (mut guard, calls) = guard();
        guard.attach("preview").unwrap();
        drop(guard);
        assert_eq!(calls.detaches.load(Ordering::SeqCst), 1);
        assert_eq!(calls.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reattach_detaches_previous_surface() {
        let (mut guard, calls) = guard();
        guard.attach("a").unwrap();
        guard.attach("b").unwrap();

        assert_eq!(guard.surface(), Some("b"));
        assert_eq!(calls.detaches.load(Ordering::SeqCst), 1);
        assert_eq!(*calls.attached.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_failed_attach_leaves_guard_detached() {
        let (mut guard, _calls) = guard();
        assert!(guard.attach("").is_err());
        assert_eq!(guard.surface(), None);
    }

    #[test]
    fn test_release_preview_drops_guard() {
        let (guard, calls) = guard();
        let mut owner = DeviceOwner::Preview(guard);

        assert!(owner.release_preview());
        assert!(owner.is_none());
        assert_eq!(calls.stops.load(Ordering::SeqCst), 1);
        assert!(!owner.release_preview());
    }

    #[test]
    fn test_take_room_keeps_preview_owner() {
        let (guard, calls) = guard();
        let mut owner = DeviceOwner::Preview(guard);

        assert!(owner.take_room().is_none());
        assert!(owner.preview().is_some());
        assert_eq!(calls.stops.load(Ordering::SeqCst), 0);
    }
}
