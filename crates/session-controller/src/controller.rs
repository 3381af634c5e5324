//! `SessionController` - the session actor.
//!
//! One task owns all session state and handles commands one at a time, so
//! every check-then-act (connect while connecting, preview while connected)
//! is atomic with respect to other commands. The two slow operations, device
//! acquisition and the token fetch, run as child tasks scoped to the
//! controller's cancellation token. Each carries an attempt id and results
//! whose id no longer matches are discarded.
//!
//! # Lifecycle
//!
//! 1. `spawn` starts the actor; `mount` queries permissions and starts the
//!    preview
//! 2. `connect` fetches a credential, hands the devices to the room
//! 3. Room disconnect, room error or `end_call` return to idle
//! 4. `shutdown` or cancellation tears everything down

use crate::config::SessionConfig;
use crate::credential::{Credential, CredentialSource};
use crate::errors::{AcquireError, SessionError, TokenFetchError};
use crate::media::{attach_or_warn, DeviceOwner, MediaDevices, PreviewGuard};
use crate::permission::{
    PermissionSource, PermissionState, PermissionStatus, PermissionTracker, Transition,
};
use crate::room::{JoinRequest, RoomConnector, RoomEvent, RoomGuard};
use crate::state::{ConnectionState, Notice, SessionSnapshot};

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Command mailbox size.
const SESSION_CHANNEL_BUFFER: usize = 64;

/// Child task result mailbox size.
const TASK_CHANNEL_BUFFER: usize = 16;

/// Platform and service collaborators.
#[derive(Clone)]
pub struct Collaborators {
    pub permissions: Arc<dyn PermissionSource>,
    pub devices: Arc<dyn MediaDevices>,
    pub rooms: Arc<dyn RoomConnector>,
    pub credentials: Arc<dyn CredentialSource>,
}

/// What a `connect` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAttempt {
    /// A token fetch was started.
    Started,
    /// Already connecting or connected; nothing was done.
    AlreadyActive,
    /// Device access is blocked; nothing was fetched.
    Blocked,
}

enum SessionCommand {
    Mount {
        respond_to: oneshot::Sender<SessionSnapshot>,
    },
    CheckPermissions {
        respond_to: oneshot::Sender<PermissionState>,
    },
    RetryPermissions {
        respond_to: oneshot::Sender<PermissionState>,
    },
    Connect {
        respond_to: oneshot::Sender<ConnectAttempt>,
    },
    EndCall {
        respond_to: oneshot::Sender<()>,
    },
    ToggleMicrophone {
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },
    ToggleCamera {
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },
    DismissNotice,
    AttachPreview {
        surface: String,
    },
    DetachPreview,
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Results reported back by child tasks.
enum TaskEvent {
    PreviewAcquired {
        attempt: u64,
        result: Result<PreviewGuard, AcquireError>,
    },
    CredentialFetched {
        attempt: u64,
        result: Result<Credential, TokenFetchError>,
    },
}

struct PendingTask {
    attempt: u64,
    cancel_token: CancellationToken,
}

impl PendingTask {
    fn matches(pending: Option<&PendingTask>, attempt: u64) -> bool {
        pending.is_some_and(|p| p.attempt == attempt)
    }
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Handle to a running `SessionController`.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    cancel_token: CancellationToken,
}

impl SessionHandle {
    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Query permissions, subscribe to changes and start the preview.
    pub async fn mount(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|respond_to| SessionCommand::Mount { respond_to })
            .await
    }

    /// Re-query platform permission status.
    pub async fn check_permissions(&self) -> Result<PermissionState, SessionError> {
        self.request(|respond_to| SessionCommand::CheckPermissions { respond_to })
            .await
    }

    /// Re-check permissions and re-attempt the preview ("Try Again").
    pub async fn retry_permissions(&self) -> Result<PermissionState, SessionError> {
        self.request(|respond_to| SessionCommand::RetryPermissions { respond_to })
            .await
    }

    /// Start a connect attempt. Returns once the attempt is started or refused.
    pub async fn connect(&self) -> Result<ConnectAttempt, SessionError> {
        self.request(|respond_to| SessionCommand::Connect { respond_to })
            .await
    }

    /// Leave the room, or abandon a pending connect.
    pub async fn end_call(&self) -> Result<(), SessionError> {
        self.request(|respond_to| SessionCommand::EndCall { respond_to })
            .await
    }

    /// Flip the microphone. Returns the state read back from the room.
    pub async fn toggle_microphone(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| SessionCommand::ToggleMicrophone { respond_to })
            .await?
    }

    /// Flip the camera. Returns the state read back from the room.
    pub async fn toggle_camera(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| SessionCommand::ToggleCamera { respond_to })
            .await?
    }

    pub async fn dismiss_notice(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::DismissNotice).await
    }

    /// Render the preview into `surface`, now and after every re-acquisition.
    pub async fn attach_preview(&self, surface: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::AttachPreview {
            surface: surface.into(),
        })
        .await
    }

    pub async fn detach_preview(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::DetachPreview).await
    }

    /// Tear down and stop the controller.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(|respond_to| SessionCommand::Shutdown { respond_to })
            .await
    }

    /// Cancel the controller without waiting.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| SessionError::ControllerClosed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(command(tx)).await?;
        rx.await.map_err(|_| SessionError::ControllerClosed)
    }
}

/// The session actor.
pub struct SessionController {
    config: SessionConfig,
    collaborators: Collaborators,
    receiver: mpsc::Receiver<SessionCommand>,
    task_tx: mpsc::Sender<TaskEvent>,
    task_rx: mpsc::Receiver<TaskEvent>,
    cancel_token: CancellationToken,
    snapshot_tx: watch::Sender<SessionSnapshot>,

    permission: PermissionTracker,
    connection: ConnectionState,
    owner: DeviceOwner,
    credential: Option<Credential>,
    notice: Option<Notice>,
    surface: Option<String>,

    permission_changes: Option<broadcast::Receiver<PermissionStatus>>,
    room_events: Option<mpsc::Receiver<RoomEvent>>,
    pending_preview: Option<PendingTask>,
    pending_fetch: Option<PendingTask>,
    next_attempt: u64,
}

impl SessionController {
    /// Spawn a new session controller.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        config: SessionConfig,
        collaborators: Collaborators,
        cancel_token: CancellationToken,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (actor, handle) = Self::new(config, collaborators, cancel_token);
        let task_handle = tokio::spawn(actor.run());
        (handle, task_handle)
    }

    fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        cancel_token: CancellationToken,
    ) -> (Self, SessionHandle) {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_BUFFER);
        let (task_tx, task_rx) = mpsc::channel(TASK_CHANNEL_BUFFER);
        let (snapshot_tx, snapshots) = watch::channel(SessionSnapshot::default());

        let actor = Self {
            config,
            collaborators,
            receiver,
            task_tx,
            task_rx,
            cancel_token: cancel_token.clone(),
            snapshot_tx,
            permission: PermissionTracker::new(),
            connection: ConnectionState::Idle,
            owner: DeviceOwner::None,
            credential: None,
            notice: None,
            surface: None,
            permission_changes: None,
            room_events: None,
            pending_preview: None,
            pending_fetch: None,
            next_attempt: 0,
        };

        let handle = SessionHandle {
            sender,
            snapshots,
            cancel_token,
        };

        (actor, handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "sc.actor.session", fields(room = %self.config.room))]
    async fn run(mut self) {
        debug!(target: "sc.controller", "SessionController started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(target: "sc.controller", "SessionController received cancellation signal");
                    self.teardown().await;
                    break;
                }

                command = self.receiver.recv() => {
                    match command {
                        Some(command) => {
                            if self.handle_command(command).await {
                                break;
                            }
                        }
                        None => {
                            debug!(target: "sc.controller", "All handles dropped, exiting");
                            self.teardown().await;
                            break;
                        }
                    }
                }

                Some(event) = self.task_rx.recv() => {
                    self.handle_task_event(event).await;
                }

                change = next_permission_change(&mut self.permission_changes) => {
                    self.handle_permission_change(change).await;
                }

                event = next_room_event(&mut self.room_events) => {
                    self.handle_room_event(event).await;
                }
            }

            self.publish();
        }

        self.publish();
        info!(target: "sc.controller", "SessionController stopped");
    }

    /// Handle a single command. Returns true if the actor should exit.
    async fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Mount { respond_to } => {
                self.mount().await;
                self.reply(respond_to, self.snapshot());
            }
            SessionCommand::CheckPermissions { respond_to } => {
                self.refresh_permissions().await;
                self.reply(respond_to, self.permission.state());
            }
            SessionCommand::RetryPermissions { respond_to } => {
                self.retry_permissions().await;
                self.reply(respond_to, self.permission.state());
            }
            SessionCommand::Connect { respond_to } => {
                let attempt = self.connect();
                self.reply(respond_to, attempt);
            }
            SessionCommand::EndCall { respond_to } => {
                self.end_call().await;
                self.reply(respond_to, ());
            }
            SessionCommand::ToggleMicrophone { respond_to } => {
                let result = self.toggle_microphone().await;
                self.reply(respond_to, result);
            }
            SessionCommand::ToggleCamera { respond_to } => {
                let result = self.toggle_camera().await;
                self.reply(respond_to, result);
            }
            SessionCommand::DismissNotice => {
                self.notice = None;
            }
            SessionCommand::AttachPreview { surface } => {
                if let Some(guard) = self.owner.preview_mut() {
                    attach_or_warn(guard, &surface);
                }
                self.surface = Some(surface);
            }
            SessionCommand::DetachPreview => {
                self.surface = None;
                if let Some(guard) = self.owner.preview_mut() {
                    guard.detach();
                }
            }
            SessionCommand::Shutdown { respond_to } => {
                self.teardown().await;
                self.reply(respond_to, ());
                return true;
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    async fn mount(&mut self) {
        match self.collaborators.permissions.subscribe() {
            Ok(changes) => self.permission_changes = Some(changes),
            Err(e) => {
                warn!(target: "sc.permission", error = %e, "Permission change notifications unavailable");
            }
        }

        self.refresh_permissions().await;
        self.maybe_acquire_preview();
    }

    async fn refresh_permissions(&mut self) {
        match self.collaborators.permissions.query().await {
            Ok(status) => {
                let transition = self.permission.apply_query(status);
                self.on_permission_transition(transition);
            }
            Err(e) => {
                warn!(target: "sc.permission", error = %e, "Permission query failed, state unchanged");
            }
        }
    }

    /// Catch up after missed notifications. The result is applied as a
    /// change notification, so `Denied` cannot jump to `Granted`.
    async fn resync_permissions(&mut self) {
        match self.collaborators.permissions.query().await {
            Ok(status) => {
                let transition = self.permission.apply_change(status);
                self.on_permission_transition(transition);
            }
            Err(e) => {
                warn!(target: "sc.permission", error = %e, "Permission re-query failed, state unchanged");
            }
        }
    }

    /// User-initiated: re-query and re-acquire even when blocked.
    async fn retry_permissions(&mut self) {
        self.refresh_permissions().await;
        self.start_preview_acquisition();
    }

    async fn handle_permission_change(
        &mut self,
        change: Result<PermissionStatus, broadcast::error::RecvError>,
    ) {
        match change {
            Ok(status) => {
                let transition = self.permission.apply_change(status);
                self.on_permission_transition(transition);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(target: "sc.permission", skipped, "Permission notifications lagged, re-querying");
                self.resync_permissions().await;
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(target: "sc.permission", "Permission notifications closed");
                self.permission_changes = None;
            }
        }
    }

    fn on_permission_transition(&mut self, transition: Option<Transition>) {
        let Some(transition) = transition else {
            return;
        };

        info!(
            target: "sc.permission",
            from = ?transition.from,
            to = ?transition.to,
            "Permission state changed"
        );

        if transition.to == PermissionState::Denied {
            self.cancel_preview_acquisition();
            if self.owner.release_preview() {
                debug!(target: "sc.media", "Preview released after access was blocked");
            }
            self.notice = Some(Notice::PermissionBlocked);
        } else if transition.from == PermissionState::Denied
            && self.notice == Some(Notice::PermissionBlocked)
        {
            self.notice = None;
        }

        self.maybe_acquire_preview();
    }

    // ------------------------------------------------------------------
    // Preview
    // ------------------------------------------------------------------

    /// Opportunistic acquisition: skipped while access is blocked.
    fn maybe_acquire_preview(&mut self) {
        if self.permission.state() == PermissionState::Denied {
            return;
        }
        self.start_preview_acquisition();
    }

    fn start_preview_acquisition(&mut self) {
        if self.connection != ConnectionState::Idle
            || !self.owner.is_none()
            || self.pending_preview.is_some()
        {
            return;
        }

        let attempt = self.next_attempt_id();
        let cancel_token = self.cancel_token.child_token();
        let task_cancel = cancel_token.clone();
        let devices = Arc::clone(&self.collaborators.devices);
        let resolution = self.config.preview_resolution;
        let task_tx = self.task_tx.clone();

        debug!(target: "sc.media", attempt, "Acquiring preview");

        tokio::spawn(async move {
            tokio::select! {
                () = task_cancel.cancelled() => {}
                result = devices.acquire_preview(resolution) => {
                    let result = result.map(PreviewGuard::new);
                    // A closed mailbox drops the guard, which stops the track.
                    let _ = task_tx.send(TaskEvent::PreviewAcquired { attempt, result }).await;
                }
            }
        });

        self.pending_preview = Some(PendingTask {
            attempt,
            cancel_token,
        });
    }

    fn cancel_preview_acquisition(&mut self) {
        self.pending_preview = None;
    }

    fn on_preview_acquired(&mut self, attempt: u64, result: Result<PreviewGuard, AcquireError>) {
        if !PendingTask::matches(self.pending_preview.as_ref(), attempt) {
            debug!(target: "sc.media", attempt, "Discarding stale preview result");
            return;
        }
        self.pending_preview = None;

        match result {
            Ok(mut guard) => {
                if self.connection != ConnectionState::Idle || !self.owner.is_none() {
                    debug!(target: "sc.media", "Devices already owned, dropping new preview");
                    return;
                }
                if let Some(surface) = self.surface.as_deref() {
                    attach_or_warn(&mut guard, surface);
                }
                self.owner = DeviceOwner::Preview(guard);
                info!(target: "sc.media", "Preview active");

                let transition = self.permission.acquisition_succeeded();
                self.on_permission_transition(transition);
            }
            Err(e) if e.is_permission_denied() => {
                warn!(target: "sc.media", error = %e, "Preview acquisition denied");
                let transition = self.permission.acquisition_denied();
                self.on_permission_transition(transition);
            }
            Err(e) => {
                warn!(target: "sc.media", error = %e, "Could not acquire preview");
            }
        }
    }

    // ------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------

    fn connect(&mut self) -> ConnectAttempt {
        if self.connection != ConnectionState::Idle {
            debug!(
                target: "sc.controller",
                connection = ?self.connection,
                "Connect ignored, attempt already active"
            );
            return ConnectAttempt::AlreadyActive;
        }

        if self.permission.state() == PermissionState::Denied {
            info!(target: "sc.controller", "Connect refused, device access blocked");
            self.notice = Some(Notice::PermissionBlocked);
            return ConnectAttempt::Blocked;
        }

        self.notice = None;
        self.connection = ConnectionState::Connecting;
        self.cancel_preview_acquisition();

        let attempt = self.next_attempt_id();
        let cancel_token = self.cancel_token.child_token();
        let task_cancel = cancel_token.clone();
        let credentials = Arc::clone(&self.collaborators.credentials);
        let room = self.config.room.clone();
        let username = self.config.username.clone();
        let task_tx = self.task_tx.clone();

        info!(target: "sc.controller", attempt, "Connecting");

        tokio::spawn(async move {
            tokio::select! {
                () = task_cancel.cancelled() => {
                    debug!(target: "sc.controller", attempt, "Token fetch cancelled");
                }
                result = credentials.fetch(&room, &username) => {
                    let _ = task_tx.send(TaskEvent::CredentialFetched { attempt, result }).await;
                }
            }
        });

        self.pending_fetch = Some(PendingTask {
            attempt,
            cancel_token,
        });

        ConnectAttempt::Started
    }

    async fn on_credential_fetched(
        &mut self,
        attempt: u64,
        result: Result<Credential, TokenFetchError>,
    ) {
        if !PendingTask::matches(self.pending_fetch.as_ref(), attempt)
            || self.connection != ConnectionState::Connecting
        {
            debug!(target: "sc.controller", attempt, "Discarding stale credential");
            return;
        }
        self.pending_fetch = None;

        match result {
            Ok(credential) => self.join_room(credential).await,
            Err(e) => {
                warn!(target: "sc.controller", error = %e, "Connect failed");
                self.notice = Some(Notice::TokenFetchFailed(e.to_string()));
                self.return_to_idle();
            }
        }
    }

    async fn join_room(&mut self, credential: Credential) {
        // The room takes the devices; the preview must be gone first.
        self.owner.release_preview();

        let request = JoinRequest {
            token: credential.access_token.clone(),
            server_url: credential.url.clone(),
            audio: true,
            video: true,
        };
        self.credential = Some(credential);
        self.connection = ConnectionState::Connected;

        let rooms = Arc::clone(&self.collaborators.rooms);
        let joined = tokio::select! {
            () = self.cancel_token.cancelled() => {
                self.credential = None;
                self.connection = ConnectionState::Idle;
                return;
            }
            joined = rooms.join(request) => joined,
        };

        match joined {
            Ok(joined) => {
                self.owner = DeviceOwner::Room(RoomGuard::new(joined.session));
                self.room_events = Some(joined.events);
                info!(target: "sc.controller", "Connected");
            }
            Err(e) => {
                warn!(target: "sc.controller", error = %e, "Room join failed");
                self.notice = Some(Notice::RoomError(e.to_string()));
                self.return_to_idle();
            }
        }
    }

    async fn handle_room_event(&mut self, event: Option<RoomEvent>) {
        if self.connection != ConnectionState::Connected {
            self.room_events = None;
            return;
        }

        match event {
            Some(RoomEvent::Error(message)) => {
                warn!(target: "sc.controller", error = %message, "Room error");
                self.notice = Some(Notice::RoomError(message));
                self.leave_room().await;
            }
            Some(RoomEvent::Disconnected) | None => {
                info!(target: "sc.controller", "Room disconnected");
                // The room is already gone; release without calling back into it.
                drop(self.owner.take_room());
            }
        }

        self.return_to_idle();
    }

    async fn end_call(&mut self) {
        match self.connection {
            ConnectionState::Idle => return,
            ConnectionState::Connecting => {
                info!(target: "sc.controller", "Connect attempt abandoned");
            }
            ConnectionState::Connected => {
                info!(target: "sc.controller", "Ending call");
                self.leave_room().await;
            }
        }
        self.return_to_idle();
    }

    async fn toggle_microphone(&mut self) -> Result<bool, SessionError> {
        let room = self.owner.room().ok_or(SessionError::NotConnected)?;
        let session = room.session();
        let enable = !session.is_microphone_enabled();
        session.set_microphone_enabled(enable).await.map_err(|e| {
            warn!(target: "sc.controller", error = %e, "Failed to toggle microphone");
            SessionError::Transport(e)
        })?;
        Ok(session.is_microphone_enabled())
    }

    async fn toggle_camera(&mut self) -> Result<bool, SessionError> {
        let room = self.owner.room().ok_or(SessionError::NotConnected)?;
        let session = room.session();
        let enable = !session.is_camera_enabled();
        session.set_camera_enabled(enable).await.map_err(|e| {
            warn!(target: "sc.controller", error = %e, "Failed to toggle camera");
            SessionError::Transport(e)
        })?;
        Ok(session.is_camera_enabled())
    }

    async fn leave_room(&mut self) {
        if let Some(room) = self.owner.take_room() {
            room.disconnect().await;
        }
    }

    /// Drop everything tied to the current attempt or call, then try the
    /// preview again.
    fn return_to_idle(&mut self) {
        self.pending_fetch = None;
        self.credential = None;
        self.room_events = None;
        self.connection = ConnectionState::Idle;
        self.maybe_acquire_preview();
    }

    async fn teardown(&mut self) {
        self.pending_fetch = None;
        self.pending_preview = None;
        self.permission_changes = None;
        self.owner.release_preview();
        self.leave_room().await;
        self.credential = None;
        self.room_events = None;
        self.connection = ConnectionState::Idle;
        debug!(target: "sc.controller", "Session torn down");
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    async fn handle_task_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::PreviewAcquired { attempt, result } => {
                self.on_preview_acquired(attempt, result);
            }
            TaskEvent::CredentialFetched { attempt, result } => {
                self.on_credential_fetched(attempt, result).await;
            }
        }
    }

    fn next_attempt_id(&mut self) -> u64 {
        self.next_attempt += 1;
        self.next_attempt
    }

    fn snapshot(&self) -> SessionSnapshot {
        let room = self.owner.room().map(RoomGuard::session);
        let preview = self.owner.preview();

        SessionSnapshot {
            permission: self.permission.state(),
            connection: self.connection,
            preview_active: preview.is_some(),
            preview_surface: preview.and_then(|p| p.surface().map(ToString::to_string)),
            has_credential: self.credential.is_some(),
            microphone_enabled: room.map(|s| s.is_microphone_enabled()),
            camera_enabled: room.map(|s| s.is_camera_enabled()),
            notice: self.notice.clone(),
        }
    }

    /// Publish first so a caller that awaited the reply sees the new state.
    fn reply<T>(&self, respond_to: oneshot::Sender<T>, value: T) {
        self.publish();
        let _ = respond_to.send(value);
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn next_permission_change(
    changes: &mut Option<broadcast::Receiver<PermissionStatus>>,
) -> Result<PermissionStatus, broadcast::error::RecvError> {
    match changes {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_room_event(events: &mut Option<mpsc::Receiver<RoomEvent>>) -> Option<RoomEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{PlatformError, TransportError};
    use crate::media::{PreviewTrack, Resolution};
    use crate::permission::DevicePermission;
    use crate::room::JoinedRoom;
    use async_trait::async_trait;

    /// Platform that always reports the same status and never notifies.
    struct FixedPermissions(PermissionStatus);

    #[async_trait]
    impl PermissionSource for FixedPermissions {
        async fn query(&self) -> Result<PermissionStatus, PlatformError> {
            Ok(self.0)
        }

        fn subscribe(&self) -> Result<broadcast::Receiver<PermissionStatus>, PlatformError> {
            Err(PlatformError::Unsupported("no notifications".to_string()))
        }
    }

    struct NoDevices;

    #[async_trait]
    impl MediaDevices for NoDevices {
        async fn acquire_preview(
            &self,
            _resolution: Resolution,
        ) -> Result<Box<dyn PreviewTrack>, AcquireError> {
            Err(AcquireError::Unavailable("no camera".to_string()))
        }
    }

    struct NoRooms;

    #[async_trait]
    impl RoomConnector for NoRooms {
        async fn join(&self, _request: JoinRequest) -> Result<JoinedRoom, TransportError> {
            Err(TransportError::Join("offline".to_string()))
        }
    }

    struct NoCredentials;

    #[async_trait]
    impl CredentialSource for NoCredentials {
        async fn fetch(&self, _room: &str, _username: &str) -> Result<Credential, TokenFetchError> {
            Err(TokenFetchError::Network("offline".to_string()))
        }
    }

    fn actor_reporting(status: PermissionStatus) -> (SessionController, SessionHandle) {
        let collaborators = Collaborators {
            permissions: Arc::new(FixedPermissions(status)),
            devices: Arc::new(NoDevices),
            rooms: Arc::new(NoRooms),
            credentials: Arc::new(NoCredentials),
        };
        SessionController::new(
            SessionConfig::default(),
            collaborators,
            CancellationToken::new(),
        )
    }

    fn granted() -> PermissionStatus {
        PermissionStatus::new(DevicePermission::Granted, DevicePermission::Granted)
    }

    fn camera_denied() -> PermissionStatus {
        PermissionStatus::new(DevicePermission::Denied, DevicePermission::Granted)
    }

    #[tokio::test]
    async fn test_lagged_notifications_never_jump_from_denied_to_granted() {
        let (mut actor, _handle) = actor_reporting(granted());
        actor.permission.apply_query(camera_denied());
        assert_eq!(actor.permission.state(), PermissionState::Denied);

        actor
            .handle_permission_change(Err(broadcast::error::RecvError::Lagged(20)))
            .await;

        assert_eq!(actor.permission.state(), PermissionState::Prompt);
    }

    #[tokio::test]
    async fn test_explicit_query_applies_platform_status() {
        let (mut actor, _handle) = actor_reporting(granted());
        actor.permission.apply_query(camera_denied());

        actor.refresh_permissions().await;

        assert_eq!(actor.permission.state(), PermissionState::Granted);
    }

    #[test]
    fn test_pending_task_cancels_on_drop() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        let pending = PendingTask {
            attempt: 1,
            cancel_token: child.clone(),
        };

        drop(pending);

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_pending_task_matches_only_its_attempt() {
        let pending = PendingTask {
            attempt: 3,
            cancel_token: CancellationToken::new(),
        };

        assert!(PendingTask::matches(Some(&pending), 3));
        assert!(!PendingTask::matches(Some(&pending), 2));
        assert!(!PendingTask::matches(None, 3));
    }

    #[tokio::test]
    async fn test_next_event_helpers_wait_forever_without_source() {
        let mut changes = None;
        let mut events = None;

        let result = tokio::time::timeout(std::time::Duration::from_millis(20), async {
            tokio::select! {
                _ = next_permission_change(&mut changes) => {}
                _ = next_room_event(&mut events) => {}
            }
        })
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_closed_room_events_yield_none() {
        let (tx, rx) = mpsc::channel(1);
        let mut events = Some(rx);
        drop(tx);

        assert_eq!(next_room_event(&mut events).await, None);
    }
}
