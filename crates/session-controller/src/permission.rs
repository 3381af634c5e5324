//! Camera/microphone permission tracking.
//!
//! The platform reports a status per device. The controller folds both into
//! one [`PermissionState`]:
//!
//! - either device denied -> `Denied`
//! - both devices granted -> `Granted`
//! - anything else -> `Prompt`
//!
//! Transitions come from three places: explicit queries (mount, retry),
//! platform change notifications, and the outcome of preview acquisition.
//! A change notification never moves `Denied` straight to `Granted`; it
//! lands on `Prompt` and the next successful acquisition grants.

use crate::errors::PlatformError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Combined permission state for camera and microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Not yet queried, or the platform cannot be queried.
    #[default]
    Unknown,
    /// The platform will ask the user.
    Prompt,
    /// Both devices are usable.
    Granted,
    /// At least one device is blocked.
    Denied,
}

/// Per-device status as the platform reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePermission {
    Granted,
    Denied,
    Prompt,
}

/// Platform status for both devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionStatus {
    pub camera: DevicePermission,
    pub microphone: DevicePermission,
}

impl PermissionStatus {
    pub fn new(camera: DevicePermission, microphone: DevicePermission) -> Self {
        Self { camera, microphone }
    }

    /// Fold the two device statuses into one state.
    pub fn derive(&self) -> PermissionState {
        derive_permission(self.camera, self.microphone)
    }
}

/// Fold camera and microphone statuses into one [`PermissionState`].
pub fn derive_permission(camera: DevicePermission, microphone: DevicePermission) -> PermissionState {
    match (camera, microphone) {
        (DevicePermission::Denied, _) | (_, DevicePermission::Denied) => PermissionState::Denied,
        (DevicePermission::Granted, DevicePermission::Granted) => PermissionState::Granted,
        _ => PermissionState::Prompt,
    }
}

/// Source of platform permission status.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Query the current status of both devices.
    ///
    /// # Errors
    ///
    /// `PlatformError::Unsupported` when the platform has no permission API.
    async fn query(&self) -> Result<PermissionStatus, PlatformError>;

    /// Subscribe to status change notifications.
    ///
    /// # Errors
    ///
    /// `PlatformError::Unsupported` when the platform cannot notify.
    fn subscribe(&self) -> Result<broadcast::Receiver<PermissionStatus>, PlatformError>;
}

/// A state change, reported only when the state actually moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PermissionState,
    pub to: PermissionState,
}

/// Current permission state plus the transition rules.
#[derive(Debug, Default)]
pub struct PermissionTracker {
    state: PermissionState,
}

impl PermissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    /// Apply the result of an explicit query (mount or user retry).
    pub fn apply_query(&mut self, status: PermissionStatus) -> Option<Transition> {
        self.set(status.derive())
    }

    /// Apply a platform change notification.
    pub fn apply_change(&mut self, status: PermissionStatus) -> Option<Transition> {
        let derived = status.derive();
        let next = if self.state == PermissionState::Denied && derived == PermissionState::Granted {
            PermissionState::Prompt
        } else {
            derived
        };
        self.set(next)
    }

    /// A preview was acquired, so both devices are usable.
    pub fn acquisition_succeeded(&mut self) -> Option<Transition> {
        self.set(PermissionState::Granted)
    }

    /// Acquisition failed with permission-denied semantics.
    pub fn acquisition_denied(&mut self) -> Option<Transition> {
        self.set(PermissionState::Denied)
    }

    fn set(&mut self, next: PermissionState) -> Option<Transition> {
        if next == self.state {
            return None;
        }
        let transition = Transition {
            from: self.state,
            to: next,
        };
        self.state = next;
        Some(transition)
    }
}
