//! Mock permission source and media devices.

use async_trait::async_trait;
use session_controller::media::{MediaDevices, PreviewTrack, Resolution};
use session_controller::permission::PermissionSource;
use session_controller::{AcquireError, DevicePermission, PermissionStatus, PlatformError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Semaphore};

/// Tracks how many parties hold the physical devices.
#[derive(Debug, Default)]
pub struct DeviceLedger {
    holders: AtomicUsize,
    max_holders: AtomicUsize,
}

impl DeviceLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn acquire(&self) {
        let now = self.holders.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_holders.fetch_max(now, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.holders.fetch_sub(1, Ordering::SeqCst);
    }

    /// Current number of holders.
    pub fn holders(&self) -> usize {
        self.holders.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous holders ever observed.
    pub fn max_holders(&self) -> usize {
        self.max_holders.load(Ordering::SeqCst)
    }
}

/// Mock platform permission API.
pub struct MockPermissionSource {
    status: Mutex<Result<PermissionStatus, PlatformError>>,
    changes: broadcast::Sender<PermissionStatus>,
    notifications: bool,
    queries: AtomicUsize,
}

impl MockPermissionSource {
    /// Source reporting `status` and supporting change notifications.
    pub fn new(status: PermissionStatus) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            status: Mutex::new(Ok(status)),
            changes,
            notifications: true,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionStatus::new(
            DevicePermission::Granted,
            DevicePermission::Granted,
        ))
    }

    pub fn prompt() -> Self {
        Self::new(PermissionStatus::new(
            DevicePermission::Prompt,
            DevicePermission::Prompt,
        ))
    }

    /// Camera blocked, microphone granted.
    pub fn camera_denied() -> Self {
        Self::new(PermissionStatus::new(
            DevicePermission::Denied,
            DevicePermission::Granted,
        ))
    }

    /// Platform without a permission API.
    pub fn unsupported() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            status: Mutex::new(Err(PlatformError::Unsupported(
                "permissions API unavailable".to_string(),
            ))),
            changes,
            notifications: false,
            queries: AtomicUsize::new(0),
        }
    }

    /// Change what the next query reports, without notifying.
    pub fn set_status(&self, status: PermissionStatus) {
        *self.status.lock().unwrap() = Ok(status);
    }

    /// Change the status and push a change notification.
    pub fn notify(&self, status: PermissionStatus) {
        self.set_status(status);
        let _ = self.changes.send(status);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionSource for MockPermissionSource {
    async fn query(&self) -> Result<PermissionStatus, PlatformError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.status.lock().unwrap().clone()
    }

    fn subscribe(&self) -> Result<broadcast::Receiver<PermissionStatus>, PlatformError> {
        if !self.notifications {
            return Err(PlatformError::Unsupported(
                "permission change events unavailable".to_string(),
            ));
        }
        Ok(self.changes.subscribe())
    }
}

/// Mock local preview track. Holds the ledger until stopped.
pub struct MockPreviewTrack {
    ledger: Arc<DeviceLedger>,
    stopped: AtomicBool,
    stops: Arc<AtomicUsize>,
    surface: Arc<Mutex<Option<String>>>,
}

impl PreviewTrack for MockPreviewTrack {
    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.ledger.release();
        }
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn attach(&self, surface: &str) -> Result<(), PlatformError> {
        if surface.is_empty() {
            return Err(PlatformError::Failed("empty surface name".to_string()));
        }
        *self.surface.lock().unwrap() = Some(surface.to_string());
        Ok(())
    }

    fn detach(&self) {
        *self.surface.lock().unwrap() = None;
    }
}

/// Mock media devices.
///
/// Succeeds by default; scripted outcomes are consumed in order. A gated
/// instance holds every acquisition until [`release`](Self::release).
pub struct MockMediaDevices {
    ledger: Arc<DeviceLedger>,
    outcomes: Mutex<VecDeque<Result<(), AcquireError>>>,
    gate: Option<Arc<Semaphore>>,
    acquisitions: AtomicUsize,
    last_resolution: Mutex<Option<Resolution>>,
    stops: Arc<AtomicUsize>,
    surface: Arc<Mutex<Option<String>>>,
}

impl MockMediaDevices {
    pub fn new(ledger: Arc<DeviceLedger>) -> Self {
        Self {
            ledger,
            outcomes: Mutex::new(VecDeque::new()),
            gate: None,
            acquisitions: AtomicUsize::new(0),
            last_resolution: Mutex::new(None),
            stops: Arc::new(AtomicUsize::new(0)),
            surface: Arc::new(Mutex::new(None)),
        }
    }

    pub fn gated(ledger: Arc<DeviceLedger>) -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new(ledger)
        }
    }

    /// Queue the outcome of a future acquisition.
    pub fn push_outcome(&self, outcome: Result<(), AcquireError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Let `n` gated acquisitions proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Number of acquisitions started.
    pub fn acquire_count(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Total `stop` calls across all tracks.
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Surface the most recent track is attached to.
    pub fn attached_surface(&self) -> Option<String> {
        self.surface.lock().unwrap().clone()
    }

    pub fn last_resolution(&self) -> Option<Resolution> {
        *self.last_resolution.lock().unwrap()
    }
}

#[async_trait]
impl MediaDevices for MockMediaDevices {
    async fn acquire_preview(
        &self,
        resolution: Resolution,
    ) -> Result<Box<dyn PreviewTrack>, AcquireError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        *self.last_resolution.lock().unwrap() = Some(resolution);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()));
        outcome?;

        self.ledger.acquire();
        Ok(Box::new(MockPreviewTrack {
            ledger: self.ledger.clone(),
            stopped: AtomicBool::new(false),
            stops: self.stops.clone(),
            surface: self.surface.clone(),
        }))
    }
}
