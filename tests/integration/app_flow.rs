//! Integration tests for the application controller.

use std::path::Path;
use std::time::Duration;

use snapshelf::app::{App, CaptureOutcome, REMEDIAL_PANEL_DELAY};
use snapshelf::capture::mock::MockBackend;
use snapshelf::capture::{CaptureOptions, capturer_for};
use snapshelf::config::{BackendKind, Settings};
use snapshelf::error::{CaptureError, SnapError};
use snapshelf::export::FILE_PREFIX;
use snapshelf::history::HistoryStore;
use snapshelf::permission::{MockPermissions, PRIVACY_PANEL_URL};
use tempfile::TempDir;

fn app_with(permissions: MockPermissions, backend: MockBackend) -> App<MockPermissions> {
    let capturer = capturer_for(BackendKind::Stream, backend, CaptureOptions::default());
    App::new(permissions, capturer)
}

fn granted_app() -> App<MockPermissions> {
    app_with(MockPermissions::granted(), MockBackend::new())
}

async fn captured_id(app: &mut App<MockPermissions>) -> uuid::Uuid {
    match app.capture().await.unwrap() {
        CaptureOutcome::Captured(summary) => summary.id,
        CaptureOutcome::PermissionRequested => panic!("capture was not permitted"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_denied_permission_requests_then_opens_settings() {
    let permissions = MockPermissions::denied();
    let backend = MockBackend::new();
    let mut app = app_with(permissions.clone(), backend.clone());

    let outcome = app.capture().await.unwrap();

    assert!(matches!(outcome, CaptureOutcome::PermissionRequested));
    assert_eq!(permissions.request_count(), 1);
    assert!(permissions.opened_urls().is_empty());
    assert!(app.history().is_empty());
    assert_eq!(backend.start_count(), 0);

    tokio::time::sleep(REMEDIAL_PANEL_DELAY - Duration::from_millis(1)).await;
    assert!(permissions.opened_urls().is_empty());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(permissions.opened_urls(), vec![PRIVACY_PANEL_URL.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_denial_is_harmless() {
    let permissions = MockPermissions::denied().failing_open();
    let mut app = app_with(permissions.clone(), MockBackend::new());

    app.capture().await.unwrap();
    app.capture().await.unwrap();
    tokio::time::sleep(REMEDIAL_PANEL_DELAY * 2).await;

    assert_eq!(permissions.request_count(), 2);
    assert_eq!(permissions.opened_urls().len(), 2);
}

#[tokio::test]
async fn test_unavailable_preflight_fails_open() {
    let mut app = app_with(MockPermissions::unavailable(), MockBackend::new());
    captured_id(&mut app).await;
    assert_eq!(app.history().len(), 1);
}

#[tokio::test]
async fn test_capture_lands_at_front_of_history() {
    let mut app = granted_app();
    let first = captured_id(&mut app).await;
    let second = captured_id(&mut app).await;

    let ids: Vec<_> = app.history().iter().map(|i| i.id()).collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn test_history_bound_applies_through_app() {
    let mut app = granted_app().with_history(HistoryStore::with_capacity(3));
    let mut last = None;
    for _ in 0..5 {
        last = Some(captured_id(&mut app).await);
    }
    assert_eq!(app.history().len(), 3);
    assert_eq!(app.item(0usize).unwrap().id(), last.unwrap());
}

#[tokio::test]
async fn test_failed_capture_leaves_history_untouched() {
    let mut app = app_with(MockPermissions::granted(), MockBackend::new().without_displays());

    let result = app.capture().await;

    assert!(matches!(result, Err(SnapError::Capture(CaptureError::NoDisplay))));
    assert!(app.history().is_empty());
}

#[tokio::test]
async fn test_subscribers_observe_captures() {
    let mut app = granted_app();
    let mut rx = app.subscribe();

    captured_id(&mut app).await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    app.clear_history();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_empty());
}

#[tokio::test]
async fn test_quick_save_writes_default_name_into_preferred_dir() {
    let temp = TempDir::new().unwrap();
    let shots = temp.path().join("shots");
    let mut app = granted_app().with_save_directory(Some(shots.clone()));
    captured_id(&mut app).await;

    let path = app.quick_save(0usize).unwrap();

    assert!(path.starts_with(&shots));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(FILE_PREFIX) && name.ends_with(".png"), "{name}");
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 40));
}

#[tokio::test]
async fn test_quick_save_twice_does_not_overwrite() {
    let temp = TempDir::new().unwrap();
    let mut app = granted_app().with_save_directory(Some(temp.path().to_path_buf()));
    captured_id(&mut app).await;

    let first = app.quick_save(0usize).unwrap();
    let second = app.quick_save(0usize).unwrap();

    assert_ne!(first, second);
    assert!(first.exists() && second.exists());
}

#[tokio::test]
async fn test_choose_save_folder_creates_and_is_used() {
    let temp = TempDir::new().unwrap();
    let chosen = temp.path().join("picked/here");
    let mut app = granted_app();
    captured_id(&mut app).await;

    app.choose_save_folder(chosen.clone()).unwrap();
    assert!(chosen.is_dir());
    assert_eq!(app.preferred_save_directory(), Some(chosen.as_path()));

    let path = app.quick_save(0usize).unwrap();
    assert_eq!(path.parent(), Some(chosen.as_path()));
}

#[tokio::test]
async fn test_save_appends_png_extension() {
    let temp = TempDir::new().unwrap();
    let mut app = granted_app();
    let id = captured_id(&mut app).await;

    let path = app.save(id, &temp.path().join("nested/mine")).unwrap();

    assert_eq!(path, temp.path().join("nested/mine.png"));
    assert!(path.is_file());
}

#[tokio::test]
async fn test_save_unknown_index() {
    let mut app = granted_app();
    captured_id(&mut app).await;

    let result = app.save(3usize, Path::new("/tmp/never-written.png"));
    assert!(matches!(
        result,
        Err(SnapError::HistoryItemNotFound { index: 3, len: 1 })
    ));
}

#[test]
fn test_from_settings_uses_override_and_save_dir() {
    let mut settings = Settings::default();
    settings.save.directory = Some("/srv/shots".into());

    let app = App::from_settings(MockPermissions::granted(), &settings, Some(BackendKind::Mock))
        .unwrap();

    assert_eq!(app.capturer_name(), "mock-stream");
    assert_eq!(app.preferred_save_directory(), Some(Path::new("/srv/shots")));
}
