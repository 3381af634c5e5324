//! `MockPlatform` bundle and snapshot helpers.

use crate::mock_credentials::MockCredentialSource;
use crate::mock_platform::{DeviceLedger, MockMediaDevices, MockPermissionSource};
use crate::mock_room::MockRoomConnector;
use session_controller::{
    Collaborators, SessionConfig, SessionController, SessionHandle, SessionSnapshot,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long [`wait_for`] waits before failing the test.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Every mock collaborator, sharing one device ledger.
///
/// Fields are public so tests can swap in a differently configured mock
/// before spawning.
pub struct MockPlatform {
    pub ledger: Arc<DeviceLedger>,
    pub permissions: Arc<MockPermissionSource>,
    pub devices: Arc<MockMediaDevices>,
    pub rooms: Arc<MockRoomConnector>,
    pub credentials: Arc<MockCredentialSource>,
    pub config: SessionConfig,
}

impl MockPlatform {
    pub fn new(permissions: MockPermissionSource) -> Self {
        let ledger = DeviceLedger::new();
        Self {
            permissions: Arc::new(permissions),
            devices: Arc::new(MockMediaDevices::new(ledger.clone())),
            rooms: Arc::new(MockRoomConnector::new(ledger.clone())),
            credentials: Arc::new(MockCredentialSource::new()),
            config: SessionConfig::default(),
            ledger,
        }
    }

    /// Both devices already granted.
    pub fn granted() -> Self {
        Self::new(MockPermissionSource::granted())
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            permissions: self.permissions.clone(),
            devices: self.devices.clone(),
            rooms: self.rooms.clone(),
            credentials: self.credentials.clone(),
        }
    }

    /// Spawn a controller wired to these mocks.
    pub fn spawn(&self) -> (SessionHandle, JoinHandle<()>) {
        SessionController::spawn(
            self.config.clone(),
            self.collaborators(),
            CancellationToken::new(),
        )
    }
}

/// Wait until a published snapshot satisfies `predicate`.
///
/// # Panics
///
/// If no matching snapshot appears within [`WAIT_TIMEOUT`].
pub async fn wait_for(
    handle: &SessionHandle,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let mut snapshots = handle.subscribe();
    tokio::time::timeout(WAIT_TIMEOUT, async {
        snapshots.wait_for(predicate).await.map(|s| s.clone())
    })
    .await
    .expect("timed out waiting for session snapshot")
    .expect("session controller stopped")
}

/// Let spawned tasks run until the controller has nothing left to do.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
