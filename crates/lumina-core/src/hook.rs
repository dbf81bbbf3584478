//! Pending-flag hook for feature code.
//!
//! A [`BusyHook`] turns a caller-owned `pending` flag into store calls. While
//! pending it shows the overlay and, on request, ramps simulated progress on a
//! timer; when the flag drops (or the hook goes away) it cancels the timer and
//! hides the overlay.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::ProgressConfig;
use crate::store::BusyStore;

// ============================================================================
// BusyRequest
// ============================================================================

/// What a feature wants the overlay to do.
///
/// # Example
///
/// ```
/// use lumina_core::BusyRequest;
///
/// let request = BusyRequest::pending()
///     .with_message("Uploading assignment...")
///     .with_auto_progress(true);
/// assert!(request.pending);
/// assert_eq!(request.message.as_deref(), Some("Uploading assignment..."));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyRequest {
    /// Whether the operation is in flight.
    pub pending: bool,
    /// Message to show; `None` keeps or restores the current one.
    pub message: Option<String>,
    /// Ramp simulated progress while pending.
    pub auto_progress: bool,
    /// Show a determinate overlay from the start.
    pub force_fullscreen: bool,
}

impl BusyRequest {
    /// A request for an operation in flight.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            pending: true,
            ..Self::default()
        }
    }

    /// A request with nothing in flight.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Sets whether the operation is in flight.
    #[must_use]
    pub fn with_pending(mut self, pending: bool) -> Self {
        self.pending = pending;
        self
    }

    /// Sets the message to show.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Enables or disables the simulated ramp.
    #[must_use]
    pub fn with_auto_progress(mut self, auto_progress: bool) -> Self {
        self.auto_progress = auto_progress;
        self
    }

    /// Starts determinate at the fullscreen floor.
    #[must_use]
    pub fn with_force_fullscreen(mut self, force_fullscreen: bool) -> Self {
        self.force_fullscreen = force_fullscreen;
        self
    }
}

// ============================================================================
// ProgressTicket
// ============================================================================

/// Handle to a running progress ramp.
///
/// Dropping the ticket cancels the ramp. Cancellation is visible to the ramp
/// before its next write, so no increment lands after the ticket is gone.
#[derive(Debug)]
pub struct ProgressTicket {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressTicket {
    /// Starts ramping the store's progress.
    ///
    /// Every tick adds a random amount in `[0, max_step)`; the ramp stops by
    /// itself once `cap` is reached. Returns `None` when called outside a tokio
    /// runtime or when `config` cannot drive a ramp (zero tick interval,
    /// non-positive or non-finite step or cap).
    pub fn spawn(store: BusyStore, config: &ProgressConfig) -> Option<Self> {
        if !ramp_is_usable(config) {
            warn!(
                tick_interval_ms = config.tick_interval_ms,
                max_step = config.max_step,
                cap = config.cap,
                "Unusable progress settings, simulated progress disabled"
            );
            return None;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "No async runtime, simulated progress disabled");
                return None;
            }
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let period = config.tick_interval();
        let (max_step, cap) = (config.max_step, config.cap);
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let step = rng.gen::<f64>() * max_step;
                match store.advance_progress_unless(&flag, step, cap) {
                    None => break,
                    Some(progress) if progress >= cap => {
                        debug!(progress, "Simulated progress reached its cap");
                        break;
                    }
                    Some(_) => {}
                }
            }
        });

        Some(Self { handle, cancelled })
    }

    /// Stops the ramp. Equivalent to dropping the ticket.
    pub fn cancel(self) {
        drop(self);
    }

    /// Returns `true` once the ramp has stopped on its own or was cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.handle.is_finished()
    }
}

fn ramp_is_usable(config: &ProgressConfig) -> bool {
    config.tick_interval_ms > 0
        && config.max_step.is_finite()
        && config.max_step > 0.0
        && config.cap.is_finite()
        && config.cap > 0.0
}

impl Drop for ProgressTicket {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.handle.abort();
    }
}

// ============================================================================
// BusyHook
// ============================================================================

/// Drives the shared store from one feature's pending flag.
///
/// Each hook owns at most one progress ramp and never touches another hook's.
///
/// # Example
///
/// ```
/// use lumina_core::{BusyHook, BusyRequest, BusyStore, ProgressConfig};
///
/// let store = BusyStore::new();
/// let mut hook = BusyHook::new(store.clone(), ProgressConfig::default());
///
/// hook.update(BusyRequest::pending().with_message("Signing in..."));
/// assert!(store.is_active());
/// assert_eq!(store.snapshot().message, "Signing in...");
///
/// hook.update(BusyRequest::idle());
/// assert!(!store.is_active());
/// ```
#[derive(Debug)]
pub struct BusyHook {
    store: BusyStore,
    config: ProgressConfig,
    request: BusyRequest,
    ticket: Option<ProgressTicket>,
    engaged: bool,
}

impl BusyHook {
    /// Creates an idle hook. Nothing is written to the store until a pending
    /// request arrives.
    #[must_use]
    pub fn new(store: BusyStore, config: ProgressConfig) -> Self {
        Self {
            store,
            config,
            request: BusyRequest::idle(),
            ticket: None,
            engaged: false,
        }
    }

    /// Applies a new request.
    ///
    /// An unchanged request is a no-op. While pending, any change re-engages:
    /// the running ramp is cancelled, the overlay is shown with the new
    /// message and the chosen progress mode starts again. Going from pending
    /// to idle cancels the ramp and hides the overlay.
    pub fn update(&mut self, request: BusyRequest) {
        if request == self.request && self.engaged == request.pending {
            return;
        }

        self.request = request;
        if self.request.pending {
            self.engage();
        } else if self.engaged {
            self.release();
        }
    }

    /// Reports real progress through to the store.
    pub fn set_progress(&self, value: f64) {
        self.store.set_progress(value);
    }

    /// Returns `true` while the hook holds the overlay.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.engaged
    }

    /// Returns `true` while a simulated progress ramp is running.
    #[must_use]
    pub fn is_simulating(&self) -> bool {
        self.ticket.as_ref().is_some_and(|ticket| !ticket.is_finished())
    }

    /// The store this hook writes to.
    #[must_use]
    pub const fn store(&self) -> &BusyStore {
        &self.store
    }

    /// Follows a stream of requests on a background task.
    ///
    /// The feature keeps the `watch::Sender` and flips `pending` on it. When
    /// the sender is dropped or the returned guard is released, the overlay is
    /// hidden if it was still pending.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use = "dropping the guard releases the hook immediately"]
    pub fn watch(
        store: BusyStore,
        config: ProgressConfig,
        mut requests: watch::Receiver<BusyRequest>,
    ) -> HookGuard {
        let task = tokio::spawn(async move {
            let mut hook = Self::new(store, config);
            let initial = requests.borrow_and_update().clone();
            hook.update(initial);

            while requests.changed().await.is_ok() {
                let request = requests.borrow_and_update().clone();
                hook.update(request);
            }
            debug!("Busy request sender dropped, releasing hook");
        });

        HookGuard { task: Some(task) }
    }

    fn engage(&mut self) {
        self.cancel_ticket();
        self.store.show(self.request.message.as_deref());

        if self.request.auto_progress {
            self.ticket = ProgressTicket::spawn(self.store.clone(), &self.config);
        } else if self.request.force_fullscreen {
            self.store.set_progress(self.config.fullscreen_floor);
        }

        self.engaged = true;
        debug!(
            message = ?self.request.message,
            auto_progress = self.request.auto_progress,
            force_fullscreen = self.request.force_fullscreen,
            "Busy hook engaged"
        );
    }

    fn release(&mut self) {
        self.cancel_ticket();
        self.store.hide();
        self.engaged = false;
        debug!("Busy hook released");
    }

    fn cancel_ticket(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            ticket.cancel();
        }
    }
}

impl Drop for BusyHook {
    fn drop(&mut self) {
        if self.engaged {
            self.release();
        } else {
            self.cancel_ticket();
        }
    }
}

/// Keeps a watched hook alive.
///
/// Dropping the guard aborts the background task; the hook is torn down when
/// the runtime drops the task. Use [`release`](Self::release) to wait for it.
#[derive(Debug)]
pub struct HookGuard {
    task: Option<JoinHandle<()>>,
}

impl HookGuard {
    /// Stops following requests and waits until the overlay is released.
    pub async fn release(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Busy hook task failed");
                }
            }
        }
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Runs `future` with the overlay held pending.
///
/// The overlay is released when the future completes and also when the
/// returned future is dropped before completion.
///
/// # Example
///
/// ```
/// use lumina_core::{track, BusyRequest, BusyStore, ProgressConfig};
///
/// let rt = tokio::runtime::Builder::new_current_thread()
///     .enable_all()
///     .build()
///     .unwrap();
/// rt.block_on(async {
///     let store = BusyStore::new();
///     let request = BusyRequest::pending().with_message("Saving...");
///     let answer = track(&store, ProgressConfig::default(), request, async { 42 }).await;
///     assert_eq!(answer, 42);
///     assert!(!store.is_active());
/// });
/// ```
pub async fn track<F>(
    store: &BusyStore,
    config: ProgressConfig,
    request: BusyRequest,
    future: F,
) -> F::Output
where
    F: Future,
{
    let mut hook = BusyHook::new(store.clone(), config);
    hook.update(request.with_pending(true));
    let output = future.await;
    drop(hook);
    output
}

// ============================================================================
// Tests
// ============================================================================
