//! Mock room connector and session.

use async_trait::async_trait;
use session_controller::room::{JoinRequest, JoinedRoom, RoomConnector, RoomEvent, RoomSession};
use session_controller::TransportError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::mock_platform::DeviceLedger;

/// Device state shared between the connector and its sessions.
#[derive(Debug, Default)]
struct RoomDevices {
    microphone: AtomicBool,
    camera: AtomicBool,
    fail_toggles: AtomicBool,
}

/// Mock joined room. Holds the ledger until disconnected or dropped.
pub struct MockRoomSession {
    ledger: Arc<DeviceLedger>,
    devices: Arc<RoomDevices>,
    connected: AtomicBool,
    disconnects: Arc<AtomicUsize>,
}

impl MockRoomSession {
    fn leave(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.ledger.release();
        }
    }
}

impl Drop for MockRoomSession {
    fn drop(&mut self) {
        self.leave();
    }
}

#[async_trait]
impl RoomSession for MockRoomSession {
    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.leave();
    }

    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), TransportError> {
        if self.devices.fail_toggles.load(Ordering::SeqCst) {
            return Err(TransportError::Control("microphone track unavailable".to_string()));
        }
        self.devices.microphone.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn set_camera_enabled(&self, enabled: bool) -> Result<(), TransportError> {
        if self.devices.fail_toggles.load(Ordering::SeqCst) {
            return Err(TransportError::Control("camera track unavailable".to_string()));
        }
        self.devices.camera.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn is_microphone_enabled(&self) -> bool {
        self.devices.microphone.load(Ordering::SeqCst)
    }

    fn is_camera_enabled(&self) -> bool {
        self.devices.camera.load(Ordering::SeqCst)
    }
}

/// Mock room connector.
pub struct MockRoomConnector {
    ledger: Arc<DeviceLedger>,
    devices: Arc<RoomDevices>,
    joins: AtomicUsize,
    disconnects: Arc<AtomicUsize>,
    fail_next: Mutex<Option<String>>,
    events: Mutex<Option<mpsc::Sender<RoomEvent>>>,
    last_request: Mutex<Option<JoinRequest>>,
}

impl MockRoomConnector {
    pub fn new(ledger: Arc<DeviceLedger>) -> Self {
        Self {
            ledger,
            devices: Arc::new(RoomDevices::default()),
            joins: AtomicUsize::new(0),
            disconnects: Arc::new(AtomicUsize::new(0)),
            fail_next: Mutex::new(None),
            events: Mutex::new(None),
            last_request: Mutex::new(None),
        }
    }

    /// Make the next join fail with `message`.
    pub fn fail_next_join(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    /// Make in-call toggles fail.
    pub fn fail_toggles(&self, fail: bool) {
        self.devices.fail_toggles.store(fail, Ordering::SeqCst);
    }

    /// Push an event into the most recently joined room.
    pub async fn emit(&self, event: RoomEvent) {
        let sender = self.events.lock().unwrap().clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }

    /// Close the event stream of the most recently joined room.
    pub fn close_events(&self) {
        self.events.lock().unwrap().take();
    }

    pub fn join_count(&self) -> usize {
        self.joins.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<JoinRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomConnector for MockRoomConnector {
    async fn join(&self, request: JoinRequest) -> Result<JoinedRoom, TransportError> {
        self.joins.fetch_add(1, Ordering::SeqCst);
        self.devices.microphone.store(request.audio, Ordering::SeqCst);
        self.devices.camera.store(request.video, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);

        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(TransportError::Join(message));
        }

        self.ledger.acquire();
        let (tx, rx) = mpsc::channel(16);
        *self.events.lock().unwrap() = Some(tx);

        Ok(JoinedRoom {
            session: Box::new(MockRoomSession {
                ledger: self.ledger.clone(),
                devices: self.devices.clone(),
                connected: AtomicBool::new(true),
                disconnects: self.disconnects.clone(),
            }),
            events: rx,
        })
    }
}
