//! Loading demos driven straight through the store or through a hook.

use std::time::Duration;

use lumina_core::{BusyHook, BusyRequest, BusyStore, ProgressConfig};
use rand::Rng;
use tokio::time::{interval_at, sleep, Instant};
use tracing::info;

const SIMPLE_MESSAGE: &str = "Please wait...";
const SIMPLE_DURATION: Duration = Duration::from_secs(3);

const PROGRESS_MESSAGE: &str = "Loading with progress...";
const PROGRESS_TICK: Duration = Duration::from_millis(300);
const PROGRESS_MAX_STEP: f64 = 15.0;
const PROGRESS_HOLD: Duration = Duration::from_millis(500);

const HOOK_MESSAGE: &str = "Working on it...";

/// Shows a spinner for three seconds.
pub async fn simple(store: &BusyStore) {
    info!("Running simple loading demo");
    store.show(Some(SIMPLE_MESSAGE));
    sleep(SIMPLE_DURATION).await;
    store.hide();
}

/// Reports random progress until 100, holds briefly, then hides.
///
/// Unlike the hook ramp this one completes, so it reports the final 100
/// itself.
pub async fn progress<R: Rng>(store: &BusyStore, rng: &mut R) {
    info!("Running progress loading demo");
    store.show(Some(PROGRESS_MESSAGE));

    let mut ticker = interval_at(Instant::now() + PROGRESS_TICK, PROGRESS_TICK);
    let mut progress = 0.0_f64;
    loop {
        ticker.tick().await;
        progress += rng.gen::<f64>() * PROGRESS_MAX_STEP;
        if progress >= 100.0 {
            store.set_progress(100.0);
            break;
        }
        store.set_progress(progress);
    }

    sleep(PROGRESS_HOLD).await;
    store.hide();
}

/// Holds a hook pending for `duration`.
pub async fn hook(store: &BusyStore, config: ProgressConfig, request: BusyRequest, duration: Duration) {
    info!(
        auto_progress = request.auto_progress,
        force_fullscreen = request.force_fullscreen,
        seconds = duration.as_secs(),
        "Running hook demo"
    );

    let mut hook = BusyHook::new(store.clone(), config);
    let request = if request.message.is_some() {
        request
    } else {
        request.with_message(HOOK_MESSAGE)
    };
    hook.update(request.with_pending(true));
    sleep(duration).await;
    hook.update(BusyRequest::idle());
}
