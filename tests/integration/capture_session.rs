//! Integration tests for single-frame capture sessions.
//!
//! Time is paused, so deadlines and scripted delays are exact.

use std::time::Duration;

use snapshelf::capture::mock::{MockBackend, Operation, StreamScript};
use snapshelf::capture::{
    CaptureOptions, CaptureRect, CaptureSession, Cancellation, PixelFormat, ScreenCapturer,
    SessionState, StreamingCapturer,
};
use snapshelf::error::CaptureError;
use tokio::time::Instant;

const TIMEOUT: Duration = Duration::from_secs(5);

fn options() -> CaptureOptions {
    CaptureOptions {
        timeout: TIMEOUT,
        ..CaptureOptions::default()
    }
}

fn own_window_ids() -> Vec<u32> {
    vec![100]
}

#[tokio::test(start_paused = true)]
async fn test_frame_before_timeout_delivers_once() {
    let mock = MockBackend::new().with_script(StreamScript::FrameAfter(Duration::from_millis(100)));
    let mut session = CaptureSession::new(&mock, options());

    let image = session.run(None).await.unwrap();
    assert_eq!((image.width(), image.height()), (64, 40));
    assert_eq!(session.state(), SessionState::Done);

    mock.assert_operations(&[
        Operation::ShareableContent,
        Operation::StartStream {
            display_id: 1,
            excluded_windows: own_window_ids(),
            width: 64,
            height: 40,
            pixel_format: PixelFormat::Bgra8,
            shows_cursor: false,
        },
        Operation::FrameDelivered,
        Operation::SinkDetached,
        Operation::StopStream,
    ]);

    // The deadline passing later changes nothing.
    tokio::time::sleep(TIMEOUT * 2).await;
    assert_eq!(mock.stop_count(), 1);
    assert_eq!(mock.operations().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_no_frame_times_out_once() {
    let mock = MockBackend::new().with_script(StreamScript::Silent);
    let start = Instant::now();

    let result = CaptureSession::new(&mock, options()).run(None).await;

    assert_eq!(result.unwrap_err(), CaptureError::Timeout(TIMEOUT));
    let elapsed = start.elapsed();
    assert!(elapsed >= TIMEOUT && elapsed < TIMEOUT + Duration::from_millis(10));
    assert_eq!(mock.stop_count(), 1);
    mock.assert_streams_released();
}

#[tokio::test(start_paused = true)]
async fn test_no_display_never_starts_stream() {
    let mock = MockBackend::new().without_displays();

    let result = CaptureSession::new(&mock, options()).run(None).await;

    assert_eq!(result.unwrap_err(), CaptureError::NoDisplay);
    assert_eq!(mock.start_count(), 0);
    assert_eq!(mock.stop_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stream_error_before_deadline_wins() {
    let mock = MockBackend::new().with_script(StreamScript::ErrorAfter(
        Duration::from_secs(1),
        "display went to sleep".to_string(),
    ));
    let start = Instant::now();

    let result = CaptureSession::new(&mock, options()).run(None).await;

    assert_eq!(
        result.unwrap_err(),
        CaptureError::StreamError("display went to sleep".to_string())
    );
    assert!(start.elapsed() < TIMEOUT);

    tokio::time::sleep(TIMEOUT * 2).await;
    assert_eq!(mock.stop_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_failure_is_reported() {
    let mock =
        MockBackend::new().with_script(StreamScript::FailStart("not authorized".to_string()));

    let result = CaptureSession::new(&mock, options()).run(None).await;

    assert_eq!(
        result.unwrap_err(),
        CaptureError::StartFailed("not authorized".to_string())
    );
    assert_eq!(mock.start_count(), 1);
    assert_eq!(mock.stop_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_content_failure_is_reported() {
    let mock = MockBackend::new()
        .with_content_error(CaptureError::StreamError("content unavailable".to_string()));

    let result = CaptureSession::new(&mock, options()).run(None).await;

    assert!(matches!(result, Err(CaptureError::StreamError(_))));
    assert_eq!(mock.start_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_frame_during_start_is_not_lost() {
    let mock = MockBackend::new().with_script(StreamScript::FrameDuringStart);

    let result = CaptureSession::new(&mock, options()).run(None).await;

    assert!(result.is_ok());
    assert_eq!(mock.count(&Operation::FrameDelivered), 1);
    assert_eq!(mock.stop_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_error_after_frame_is_ignored() {
    let mock =
        MockBackend::new().with_script(StreamScript::FrameThenError(Duration::from_millis(50)));

    let result = CaptureSession::new(&mock, options()).run(None).await;

    assert!(result.is_ok());
    assert_eq!(mock.count(&Operation::FrameDelivered), 1);
    mock.assert_streams_released();
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_frames_yield_one_image() {
    let mock =
        MockBackend::new().with_script(StreamScript::DuplicateFrames(Duration::from_millis(50)));

    let result = CaptureSession::new(&mock, options()).run(None).await;

    assert!(result.is_ok());
    assert_eq!(mock.count(&Operation::FrameDelivered), 2);
    assert_eq!(mock.count(&Operation::SinkDetached), 2);
    assert_eq!(mock.stop_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_stream_stops_after_first_frame() {
    let mock =
        MockBackend::new().with_script(StreamScript::FramesEvery(Duration::from_millis(16)));

    let result = CaptureSession::new(&mock, options()).run(None).await;
    assert!(result.is_ok());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(mock.count(&Operation::FrameDelivered), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_ends_capture() {
    let mock = MockBackend::new().with_script(StreamScript::Silent);
    let (cancel, trigger) = Cancellation::new();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });
    let start = Instant::now();

    let result = CaptureSession::new(&mock, options()).run(Some(cancel)).await;

    assert_eq!(result.unwrap_err(), CaptureError::Cancelled);
    assert!(start.elapsed() < TIMEOUT);
    assert_eq!(mock.stop_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_trigger_leaves_timeout_in_charge() {
    let mock = MockBackend::new().with_script(StreamScript::Silent);
    let (cancel, trigger) = Cancellation::new();
    drop(trigger);

    let result = CaptureSession::new(&mock, options()).run(Some(cancel)).await;

    assert_eq!(result.unwrap_err(), CaptureError::Timeout(TIMEOUT));
}

#[tokio::test(start_paused = true)]
async fn test_session_is_single_use() {
    let mock = MockBackend::new();
    let mut session = CaptureSession::new(&mock, options());

    assert!(session.run(None).await.is_ok());
    assert!(matches!(
        session.run(None).await,
        Err(CaptureError::StartFailed(_))
    ));
    assert_eq!(mock.start_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_own_windows_can_be_included() {
    let mock = MockBackend::new();
    let options = CaptureOptions {
        exclude_own_windows: false,
        show_cursor: true,
        ..options()
    };

    CaptureSession::new(&mock, options).run(None).await.unwrap();

    mock.assert_contains(&Operation::StartStream {
        display_id: 1,
        excluded_windows: Vec::new(),
        width: 64,
        height: 40,
        pixel_format: PixelFormat::Bgra8,
        shows_cursor: true,
    });
}

#[tokio::test(start_paused = true)]
async fn test_capture_rect_sizes_the_stream() {
    let mock = MockBackend::new();
    let options = CaptureOptions {
        capture_rect: Some(CaptureRect {
            x: 8,
            y: 4,
            width: 16,
            height: 10,
        }),
        ..options()
    };

    let image = CaptureSession::new(&mock, options).run(None).await.unwrap();
    assert_eq!((image.width(), image.height()), (16, 10));
}

#[tokio::test(start_paused = true)]
async fn test_capture_rect_outside_display_is_rejected() {
    let mock = MockBackend::new();
    let options = CaptureOptions {
        capture_rect: Some(CaptureRect {
            x: 60,
            y: 0,
            width: 16,
            height: 10,
        }),
        ..options()
    };

    let result = CaptureSession::new(&mock, options).run(None).await;
    assert!(matches!(result, Err(CaptureError::StartFailed(_))));
    assert_eq!(mock.start_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_streaming_capturer_runs_fresh_sessions() {
    let mock = MockBackend::new();
    let capturer = StreamingCapturer::new(mock.clone(), options());

    let first = capturer.capture_once(None).await.unwrap();
    let second = capturer.capture_once(None).await.unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(mock.start_count(), 2);
    mock.assert_streams_released();
}
