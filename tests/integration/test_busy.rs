//! Integration tests for the busy store, hooks and the overlay mount.
//!
//! Time is paused in every test so progress ramps advance deterministically.

use std::time::Duration;

use lumina_core::{
    track, BusyHook, BusyRequest, BusyStatus, BusyStore, Layout, OverlayView, ProgressConfig,
};
use tokio::sync::watch;
use tokio::time::sleep;

fn seeded() -> ProgressConfig {
    ProgressConfig::default().with_seed(11)
}

// ============================================================================
// Hook Scenarios
// ============================================================================

/// Tests a sign-in: spinner while the request runs, hidden afterwards.
#[tokio::test(start_paused = true)]
async fn test_sign_in_shows_spinner_until_done() {
    let store = BusyStore::new();
    let mut hook = BusyHook::new(store.clone(), seeded());

    hook.update(BusyRequest::pending().with_message("Signing in..."));
    let state = store.snapshot();
    assert!(state.active);
    assert_eq!(state.message, "Signing in...");
    assert_eq!(store.status(), BusyStatus::Indeterminate);

    sleep(Duration::from_secs(2)).await;
    // no ramp was asked for
    assert!(store.snapshot().progress.abs() < f64::EPSILON);

    hook.update(BusyRequest::idle());
    assert_eq!(store.status(), BusyStatus::Idle);
    // the message lingers until the next show
    assert_eq!(store.snapshot().message, "Signing in...");
}

/// Tests that the last writer wins between two features sharing the store.
#[tokio::test(start_paused = true)]
async fn test_two_hooks_last_write_wins() {
    let store = BusyStore::new();
    let mut courses = BusyHook::new(store.clone(), seeded());
    let mut profile = BusyHook::new(store.clone(), seeded());

    courses.update(BusyRequest::pending().with_message("Fetching courses..."));
    profile.update(BusyRequest::pending().with_message("Saving changes..."));
    assert_eq!(store.snapshot().message, "Saving changes...");

    // no reference counting: the first feature finishing hides the overlay
    courses.update(BusyRequest::idle());
    assert!(!store.is_active());
    assert!(profile.is_pending());

    profile.update(BusyRequest::idle());
    assert!(!store.is_active());
}

/// Tests that a ramp reaches its cap and stops there.
#[tokio::test(start_paused = true)]
async fn test_auto_progress_stops_at_cap() {
    let store = BusyStore::new();
    let config = seeded();
    let cap = config.cap;
    let mut hook = BusyHook::new(store.clone(), config);

    hook.update(BusyRequest::pending().with_auto_progress(true));
    assert!(hook.is_simulating());

    sleep(Duration::from_secs(1)).await;
    let early = store.snapshot().progress;
    assert!(early > 0.0 && early < cap);
    assert_eq!(store.status(), BusyStatus::Determinate);

    // plenty of ticks to reach the cap
    sleep(Duration::from_secs(600)).await;
    assert!((store.snapshot().progress - cap).abs() < f64::EPSILON);
    assert!(!hook.is_simulating());

    hook.update(BusyRequest::idle());
    assert!(store.snapshot().progress.abs() < f64::EPSILON);
}

/// Tests that a ramp stopped by the hook writes nothing afterwards.
#[tokio::test(start_paused = true)]
async fn test_no_progress_after_release() {
    let store = BusyStore::new();
    let mut hook = BusyHook::new(store.clone(), seeded());

    hook.update(BusyRequest::pending().with_auto_progress(true));
    sleep(Duration::from_millis(1600)).await;
    hook.update(BusyRequest::idle());

    let mut changes = store.subscribe();
    sleep(Duration::from_secs(30)).await;
    assert!(!changes.has_changed().unwrap());
    assert!(store.snapshot().progress.abs() < f64::EPSILON);
}

/// Tests that real progress reported by the caller shows through.
#[tokio::test(start_paused = true)]
async fn test_reported_progress_passes_through() {
    let store = BusyStore::new();
    let mut hook = BusyHook::new(store.clone(), seeded());

    hook.update(BusyRequest::pending().with_message("Uploading assignment..."));
    hook.set_progress(30.0);
    hook.set_progress(75.0);

    assert_eq!(
        OverlayView::from_state(&store.snapshot()),
        OverlayView::Determinate {
            message: "Uploading assignment...".to_string(),
            percent: 75
        }
    );
}

// ============================================================================
// Watched Requests
// ============================================================================

/// Tests following a feature's pending flag through a watch channel.
#[tokio::test(start_paused = true)]
async fn test_watched_requests_drive_the_overlay() {
    let store = BusyStore::new();
    let (requests, rx) = watch::channel(BusyRequest::idle());
    let guard = BusyHook::watch(store.clone(), seeded(), rx);

    sleep(Duration::from_millis(10)).await;
    assert!(!store.is_active());

    requests
        .send(BusyRequest::pending().with_message("Enrolling..."))
        .unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(store.is_active());
    assert_eq!(store.snapshot().message, "Enrolling...");

    requests.send_modify(|request| request.pending = false);
    sleep(Duration::from_millis(10)).await;
    assert!(!store.is_active());

    guard.release().await;
}

/// Tests that releasing the guard hides an overlay that is still pending.
#[tokio::test(start_paused = true)]
async fn test_released_guard_hides_pending_overlay() {
    let store = BusyStore::new();
    let (_requests, rx) = watch::channel(BusyRequest::pending().with_auto_progress(true));
    let guard = BusyHook::watch(store.clone(), seeded(), rx);

    sleep(Duration::from_secs(2)).await;
    assert!(store.is_active());

    guard.release().await;
    assert!(!store.is_active());
    assert!(store.snapshot().progress.abs() < f64::EPSILON);
}

// ============================================================================
// Overlay Mount
// ============================================================================

/// Tests what a fullscreen overlay shows while a forced hook is pending.
#[tokio::test(start_paused = true)]
async fn test_mounted_overlay_follows_forced_hook() {
    let store = BusyStore::new();
    let mount = store.mount_overlay(Layout::Fullscreen).unwrap();
    assert_eq!(mount.view(), OverlayView::Hidden);
    assert!(!mount.blocks_input());

    let mut hook = BusyHook::new(store.clone(), seeded());
    hook.update(
        BusyRequest::pending()
            .with_message("Loading dashboard...")
            .with_force_fullscreen(true),
    );

    assert!(mount.blocks_input());
    assert_eq!(
        mount.view(),
        OverlayView::Determinate {
            message: "Loading dashboard...".to_string(),
            percent: 10
        }
    );
    assert!(mount.render(0).contains("10% complete"));

    drop(hook);
    assert_eq!(mount.view(), OverlayView::Hidden);
    assert_eq!(mount.render(0), "");
}

/// Tests that a second overlay cannot mount while the first is alive.
#[tokio::test]
async fn test_only_one_overlay_mounts() {
    let store = BusyStore::new();
    let first = store.mount_overlay(Layout::Inline).unwrap();
    assert!(store.mount_overlay(Layout::Fullscreen).is_err());

    drop(first);
    let second = store.mount_overlay(Layout::Fullscreen).unwrap();
    assert_eq!(second.layout(), Layout::Fullscreen);
}

// ============================================================================
// Tracked Futures
// ============================================================================

/// Tests that `track` holds the overlay for exactly the future's lifetime.
#[tokio::test(start_paused = true)]
async fn test_track_holds_overlay_while_running() {
    let store = BusyStore::new();
    let observer = store.clone();

    let task = tokio::spawn(async move {
        let request = BusyRequest::pending()
            .with_message("Submitting quiz...")
            .with_auto_progress(true);
        track(&store, seeded(), request, async {
            sleep(Duration::from_secs(3)).await;
            "submitted"
        })
        .await
    });

    sleep(Duration::from_secs(2)).await;
    assert!(observer.is_active());
    assert!(observer.snapshot().progress > 0.0);

    assert_eq!(task.await.unwrap(), "submitted");
    assert!(!observer.is_active());
    assert!(observer.snapshot().progress.abs() < f64::EPSILON);
}
