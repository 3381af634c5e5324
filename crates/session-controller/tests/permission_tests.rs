//! Permission state machine tests for the session controller.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use sc_test_utils::{settle, wait_for, MockMediaDevices, MockPermissionSource, MockPlatform};
use session_controller::state::PERMISSION_BLOCKED_MESSAGE;
use session_controller::{
    AcquireError, ConnectAttempt, DevicePermission, Notice, PermissionState, PermissionStatus,
};
use std::sync::Arc;

fn both(permission: DevicePermission) -> PermissionStatus {
    PermissionStatus::new(permission, permission)
}

#[tokio::test]
async fn test_camera_denied_blocks_connect_without_fetching() {
    let platform = MockPlatform::new(MockPermissionSource::camera_denied());
    let (handle, _task) = platform.spawn();

    let snapshot = handle.mount().await.unwrap();

    assert_eq!(snapshot.permission, PermissionState::Denied);
    assert!(!snapshot.can_connect());
    assert_eq!(snapshot.remediation(), Some(PERMISSION_BLOCKED_MESSAGE));

    assert_eq!(handle.connect().await.unwrap(), ConnectAttempt::Blocked);
    settle().await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.notice, Some(Notice::PermissionBlocked));
    assert_eq!(
        snapshot.notice_message().as_deref(),
        Some(PERMISSION_BLOCKED_MESSAGE)
    );
    assert_eq!(platform.credentials.fetch_count(), 0);
    assert_eq!(platform.devices.acquire_count(), 0);
}

#[tokio::test]
async fn test_prompt_then_successful_acquisition_grants() {
    let platform = MockPlatform::new(MockPermissionSource::prompt());
    let (handle, _task) = platform.spawn();

    handle.mount().await.unwrap();
    let snapshot = wait_for(&handle, |s| s.preview_active).await;

    assert_eq!(snapshot.permission, PermissionState::Granted);
}

#[tokio::test]
async fn test_unsupported_permission_api_still_previews() {
    let platform = MockPlatform::new(MockPermissionSource::unsupported());
    let (handle, _task) = platform.spawn();

    let mounted = handle.mount().await.unwrap();
    assert_eq!(mounted.permission, PermissionState::Unknown);

    let snapshot = wait_for(&handle, |s| s.preview_active).await;
    assert_eq!(snapshot.permission, PermissionState::Granted);
}

#[tokio::test]
async fn test_denied_acquisition_sets_denied() {
    let platform = MockPlatform::new(MockPermissionSource::prompt());
    platform.devices.push_outcome(Err(AcquireError::classify(
        "NotAllowedError",
        "Permission dismissed",
    )));
    let (handle, _task) = platform.spawn();

    handle.mount().await.unwrap();
    let snapshot = wait_for(&handle, |s| s.permission == PermissionState::Denied).await;

    assert!(!snapshot.preview_active);
    assert_eq!(snapshot.notice, Some(Notice::PermissionBlocked));
    assert!(!snapshot.can_connect());
}

#[tokio::test]
async fn test_transient_acquisition_failure_is_not_retried() {
    let platform = MockPlatform::new(MockPermissionSource::prompt());
    platform
        .devices
        .push_outcome(Err(AcquireError::classify("NotReadableError", "Device in use")));
    let (handle, _task) = platform.spawn();

    handle.mount().await.unwrap();
    settle().await;
    settle().await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.permission, PermissionState::Prompt);
    assert!(!snapshot.preview_active);
    assert!(snapshot.can_connect());
    assert_eq!(platform.devices.acquire_count(), 1);
}

#[tokio::test]
async fn test_change_notification_to_denied_releases_preview() {
    let platform = MockPlatform::granted();
    let (handle, _task) = platform.spawn();
    handle.mount().await.unwrap();
    wait_for(&handle, |s| s.preview_active).await;

    platform
        .permissions
        .notify(PermissionStatus::new(DevicePermission::Granted, DevicePermission::Denied));
    let snapshot = wait_for(&handle, |s| s.permission == PermissionState::Denied).await;

    assert!(!snapshot.preview_active);
    assert_eq!(snapshot.notice, Some(Notice::PermissionBlocked));
    assert_eq!(platform.ledger.holders(), 0);
}

#[tokio::test]
async fn test_change_from_denied_goes_through_prompt() {
    let mut platform = MockPlatform::new(MockPermissionSource::camera_denied());
    platform.devices = Arc::new(MockMediaDevices::gated(platform.ledger.clone()));
    let (handle, _task) = platform.spawn();
    handle.mount().await.unwrap();
    assert_eq!(handle.snapshot().permission, PermissionState::Denied);

    platform.permissions.notify(both(DevicePermission::Granted));
    let snapshot = wait_for(&handle, |s| s.permission == PermissionState::Prompt).await;
    assert_eq!(snapshot.notice, None);
    assert_eq!(platform.devices.acquire_count(), 1);

    platform.devices.release(1);
    let snapshot = wait_for(&handle, |s| s.preview_active).await;
    assert_eq!(snapshot.permission, PermissionState::Granted);
}

#[tokio::test]
async fn test_prompt_to_granted_by_notification() {
    let mut platform = MockPlatform::new(MockPermissionSource::prompt());
    platform.devices = Arc::new(MockMediaDevices::gated(platform.ledger.clone()));
    let (handle, _task) = platform.spawn();
    handle.mount().await.unwrap();
    assert_eq!(handle.snapshot().permission, PermissionState::Prompt);

    platform.permissions.notify(both(DevicePermission::Granted));

    wait_for(&handle, |s| s.permission == PermissionState::Granted).await;
    assert_eq!(platform.devices.acquire_count(), 1);
}

#[tokio::test]
async fn test_retry_after_user_resets_permission() {
    let platform = MockPlatform::new(MockPermissionSource::camera_denied());
    let (handle, _task) = platform.spawn();
    handle.mount().await.unwrap();

    platform.permissions.set_status(both(DevicePermission::Granted));
    let state = handle.retry_permissions().await.unwrap();
    assert_eq!(state, PermissionState::Granted);

    let snapshot = wait_for(&handle, |s| s.preview_active).await;
    assert_eq!(snapshot.notice, None);
    assert!(snapshot.can_connect());
}

#[tokio::test]
async fn test_retry_while_still_denied_reattempts_acquisition() {
    let platform = MockPlatform::new(MockPermissionSource::camera_denied());
    platform.devices.push_outcome(Err(AcquireError::classify(
        "Error",
        "Permission denied by system",
    )));
    let (handle, _task) = platform.spawn();
    handle.mount().await.unwrap();
    assert_eq!(platform.devices.acquire_count(), 0);

    let state = handle.retry_permissions().await.unwrap();
    assert_eq!(state, PermissionState::Denied);
    settle().await;

    assert_eq!(platform.devices.acquire_count(), 1);
    assert_eq!(handle.snapshot().permission, PermissionState::Denied);
}

#[tokio::test]
async fn test_retry_acquisition_is_the_way_out_without_permission_api() {
    let platform = MockPlatform::new(MockPermissionSource::unsupported());
    platform.devices.push_outcome(Err(AcquireError::classify(
        "NotAllowedError",
        "Permission denied",
    )));
    let (handle, _task) = platform.spawn();
    handle.mount().await.unwrap();
    wait_for(&handle, |s| s.permission == PermissionState::Denied).await;

    handle.retry_permissions().await.unwrap();

    let snapshot = wait_for(&handle, |s| s.preview_active).await;
    assert_eq!(snapshot.permission, PermissionState::Granted);
    assert_eq!(snapshot.notice, None);
}

#[tokio::test]
async fn test_check_permissions_requeries_platform() {
    let platform = MockPlatform::new(MockPermissionSource::prompt());
    let (handle, _task) = platform.spawn();
    handle.mount().await.unwrap();
    let before = platform.permissions.query_count();

    platform
        .permissions
        .set_status(PermissionStatus::new(DevicePermission::Denied, DevicePermission::Prompt));
    let state = handle.check_permissions().await.unwrap();

    assert_eq!(state, PermissionState::Denied);
    assert_eq!(platform.permissions.query_count(), before + 1);
}
