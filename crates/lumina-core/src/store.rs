//! The shared busy-state store.
//!
//! A [`BusyStore`] is created once at application start and cloned into every
//! component that needs it. All clones share one [`BusyState`]; every mutation
//! is applied under the channel lock, so observers never see a half-applied
//! change. Concurrent writers are not merged: the most recent call wins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::config::Config;
use crate::error::{LuminaError, Result};
use crate::presentation::{Layout, OverlayMount};
use crate::state::{BusyState, BusyStatus, DEFAULT_MESSAGE};

/// Handle to the shared busy state.
///
/// Cloning is cheap and every clone refers to the same state.
///
/// # Example
///
/// ```
/// use lumina_core::BusyStore;
///
/// let store = BusyStore::new();
/// store.show(Some("Signing in..."));
/// assert!(store.snapshot().active);
///
/// store.set_progress(40.0);
/// store.hide();
/// assert_eq!(store.snapshot().progress, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BusyStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    sender: watch::Sender<BusyState>,
    default_message: String,
    overlay_mounted: AtomicBool,
}

impl Default for BusyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BusyStore {
    /// Creates an idle store with the `"Loading..."` default message.
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_message(DEFAULT_MESSAGE)
    }

    /// Creates an idle store with a custom default message.
    #[must_use]
    pub fn with_default_message(default_message: impl Into<String>) -> Self {
        let default_message = default_message.into();
        let (sender, _) = watch::channel(BusyState::new(default_message.clone()));
        Self {
            inner: Arc::new(StoreInner {
                sender,
                default_message,
                overlay_mounted: AtomicBool::new(false),
            }),
        }
    }

    /// Creates an idle store using the configured default message.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_default_message(config.default_message.clone())
    }

    /// Activates the overlay, optionally replacing the message.
    pub fn show(&self, message: Option<&str>) {
        self.mutate("show", |state, default| state.show(message, default));
    }

    /// Deactivates the overlay and resets progress.
    pub fn hide(&self) {
        self.mutate("hide", |state, _| state.hide());
    }

    /// Activates or deactivates; deactivating resets progress like [`hide`](Self::hide).
    pub fn set_active(&self, active: bool) {
        self.mutate("set_active", |state, default| {
            state.set_active(active, default);
        });
    }

    /// Stores `value` as the current progress. No clamping is applied.
    pub fn set_progress(&self, value: f64) {
        self.mutate("set_progress", |state, _| state.set_progress(value));
    }

    /// Replaces the message, whether or not the overlay is active.
    pub fn set_message(&self, message: &str) {
        self.mutate("set_message", |state, _| state.set_message(message));
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BusyState {
        self.inner.sender.borrow().clone()
    }

    /// Returns the derived status of the current state.
    #[must_use]
    pub fn status(&self) -> BusyStatus {
        self.inner.sender.borrow().status()
    }

    /// Returns `true` while a blocking operation is displayed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.sender.borrow().active
    }

    /// Subscribes to state changes.
    ///
    /// The receiver always holds the latest state; intermediate states may be
    /// skipped by slow observers but are never observed partially applied.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BusyState> {
        self.inner.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }

    /// Returns the message restored when an operation starts without one.
    #[must_use]
    pub fn default_message(&self) -> &str {
        &self.inner.default_message
    }

    /// Mounts the overlay that renders this store.
    ///
    /// Only one overlay may be mounted at a time; the slot is freed when the
    /// returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns `LuminaError::OverlayAlreadyMounted` if another guard is alive.
    pub fn mount_overlay(&self, layout: Layout) -> Result<OverlayMount> {
        self.inner
            .overlay_mounted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LuminaError::OverlayAlreadyMounted)?;
        debug!(?layout, "Overlay mounted");
        Ok(OverlayMount::new(self.clone(), layout))
    }

    pub(crate) fn release_overlay(&self) {
        self.inner.overlay_mounted.store(false, Ordering::Release);
        debug!("Overlay unmounted");
    }

    /// Adds `step` to the current progress, stopping at `cap`.
    ///
    /// Returns the progress after the call, or `None` when `cancelled` is
    /// raised. The flag is checked under the channel lock, so a ticket
    /// cancelled before a `hide` can never write after it. Progress already at
    /// or above `cap` is left alone.
    pub(crate) fn advance_progress_unless(
        &self,
        cancelled: &AtomicBool,
        step: f64,
        cap: f64,
    ) -> Option<f64> {
        let mut advanced = None;
        self.inner.sender.send_if_modified(|state| {
            if cancelled.load(Ordering::Acquire) {
                return false;
            }
            if state.progress >= cap {
                advanced = Some(state.progress);
                return false;
            }
            let before = state.clone();
            state.set_progress((state.progress + step).min(cap));
            advanced = Some(state.progress);
            *state != before
        });
        advanced
    }

    fn mutate(&self, operation: &'static str, apply: impl FnOnce(&mut BusyState, &str)) {
        let default_message = self.inner.default_message.as_str();
        self.inner.sender.send_if_modified(|state| {
            let before = state.clone();
            apply(state, default_message);

            let (from, to) = (before.status(), state.status());
            if from != to {
                debug!(operation, %from, %to, message = %state.message, "Busy status changed");
            }
            *state != before
        });
    }
}
