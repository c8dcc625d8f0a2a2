//! Integration tests for the snapshot strategy and capturer selection.
//!
//! Snapshots run on the blocking pool, so these tests use real time.

use std::time::Duration;

use snapshelf::capture::mock::{MockBackend, Operation};
use snapshelf::capture::{
    CaptureOptions, ScreenCapturer, SnapshotCapturer, capturer_for, select_capturer,
};
use snapshelf::config::BackendKind;
use snapshelf::error::CaptureError;

#[tokio::test]
async fn test_snapshot_captures_primary_display() {
    let mock = MockBackend::demo();
    let capturer = SnapshotCapturer::new(mock.clone(), Duration::from_secs(5));

    let image = capturer.capture_once(None).await.unwrap();

    assert_eq!((image.width(), image.height()), (320, 200));
    mock.assert_operations(&[Operation::Snapshot]);
}

#[tokio::test]
async fn test_snapshot_without_display() {
    let capturer = SnapshotCapturer::new(MockBackend::new().without_displays(), Duration::from_secs(5));

    let result = capturer.capture_once(None).await;
    assert_eq!(result.unwrap_err(), CaptureError::NoDisplay);
}

#[tokio::test]
async fn test_auto_falls_back_to_snapshot() {
    let mock = MockBackend::new().without_streaming();
    let capturer = capturer_for(BackendKind::Auto, mock.clone(), CaptureOptions::default());

    assert_eq!(capturer.name(), "mock-snapshot");
    capturer.capture_once(None).await.unwrap();
    assert_eq!(mock.start_count(), 0);
    assert_eq!(mock.count(&Operation::Snapshot), 1);
}

#[tokio::test]
async fn test_mock_kind_selects_streaming_mock() {
    let capturer = select_capturer(BackendKind::Mock, CaptureOptions::default()).unwrap();
    assert_eq!(capturer.name(), "mock-stream");

    let image = capturer.capture_once(None).await.unwrap();
    assert_eq!((image.width(), image.height()), (320, 200));
}

#[cfg(not(feature = "native"))]
#[test]
fn test_platform_backend_needs_native_feature() {
    for kind in [BackendKind::Auto, BackendKind::Stream, BackendKind::Snapshot] {
        let result = select_capturer(kind, CaptureOptions::default());
        assert!(matches!(result, Err(CaptureError::BackendUnavailable(_))));
    }
}
