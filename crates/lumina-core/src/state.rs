//! Busy-state types.
//!
//! [`BusyState`] is the snapshot every overlay renders from. Its mutation
//! methods are the whole state machine; [`crate::BusyStore`] only makes them
//! shared and observable.

use serde::{Deserialize, Deserializer, Serialize};

/// Message shown when an operation starts without one of its own.
pub const DEFAULT_MESSAGE: &str = "Loading...";

// ============================================================================
// BusyStatus
// ============================================================================

/// Derived status of the busy state.
///
/// - `Idle` -> `Indeterminate` via `show` / `set_active(true)`
/// - `Indeterminate` -> `Determinate` via `set_progress(v > 0)`
/// - any busy status -> `Idle` via `hide` / `set_active(false)`
///
/// There is no terminal status; the cycle repeats for the life of the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyStatus {
    /// No blocking operation is displayed.
    #[default]
    Idle,
    /// Busy without reported progress; render a spinner.
    Indeterminate,
    /// Busy with reported progress; render a percentage.
    Determinate,
}

impl BusyStatus {
    /// Returns `true` for both busy statuses.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumina_core::BusyStatus;
    ///
    /// assert!(BusyStatus::Indeterminate.is_busy());
    /// assert!(BusyStatus::Determinate.is_busy());
    /// assert!(!BusyStatus::Idle.is_busy());
    /// ```
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Indeterminate | Self::Determinate)
    }
}

impl std::fmt::Display for BusyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Indeterminate => write!(f, "indeterminate"),
            Self::Determinate => write!(f, "determinate"),
        }
    }
}

// ============================================================================
// BusyState
// ============================================================================

/// Snapshot of the shared busy state.
///
/// Progress is stored exactly as given. Values outside `0..=100` are kept and
/// rendered as-is; clamping is the caller's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyState {
    /// Whether a blocking operation is currently displayed.
    pub active: bool,

    /// Human-readable description of the current operation.
    pub message: String,

    /// Reported progress; 0 means none was reported.
    ///
    /// Non-finite values are written as `null` in JSON and read back as NaN.
    #[serde(deserialize_with = "deserialize_progress")]
    pub progress: f64,

    /// Whether positive progress was reported during this busy period.
    #[serde(default)]
    pub determinate: bool,

    /// Set by `hide`; the next `show` without a message restores the default.
    #[serde(skip)]
    message_stale: bool,
}

/// Compares what observers can see; the restore marker is bookkeeping.
impl PartialEq for BusyState {
    fn eq(&self, other: &Self) -> bool {
        self.active == other.active
            && self.message == other.message
            && self.progress.to_bits() == other.progress.to_bits()
            && self.determinate == other.determinate
    }
}

impl Default for BusyState {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE)
    }
}

impl BusyState {
    /// Creates an idle state carrying the given default message.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumina_core::{BusyState, BusyStatus};
    ///
    /// let state = BusyState::new("Loading...");
    /// assert!(!state.active);
    /// assert_eq!(state.message, "Loading...");
    /// assert_eq!(state.status(), BusyStatus::Idle);
    /// ```
    #[must_use]
    pub fn new(default_message: impl Into<String>) -> Self {
        Self {
            active: false,
            message: default_message.into(),
            progress: 0.0,
            determinate: false,
            message_stale: false,
        }
    }

    /// Returns the derived status.
    #[must_use]
    pub const fn status(&self) -> BusyStatus {
        match (self.active, self.determinate) {
            (false, _) => BusyStatus::Idle,
            (true, false) => BusyStatus::Indeterminate,
            (true, true) => BusyStatus::Determinate,
        }
    }

    /// Marks the state active.
    ///
    /// A given non-empty message overwrites the current one; an empty one
    /// counts as not given. Without one, the current
    /// message is kept while already active; coming back from idle restores
    /// `default_message` unless `set_message` was called in between.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumina_core::BusyState;
    ///
    /// let mut state = BusyState::default();
    /// state.show(Some("A"), "Loading...");
    /// state.show(None, "Loading...");
    /// assert_eq!(state.message, "A");
    ///
    /// state.hide();
    /// state.show(None, "Loading...");
    /// assert_eq!(state.message, "Loading...");
    /// ```
    pub fn show(&mut self, message: Option<&str>, default_message: &str) {
        match message.filter(|message| !message.is_empty()) {
            Some(message) => message.clone_into(&mut self.message),
            None if !self.active && self.message_stale => {
                default_message.clone_into(&mut self.message);
            }
            None => {}
        }
        self.active = true;
        self.message_stale = false;
    }

    /// Marks the state idle and resets progress. The message is left as is.
    pub fn hide(&mut self) {
        self.active = false;
        self.progress = 0.0;
        self.determinate = false;
        self.message_stale = true;
    }

    /// Toggles activity; `false` has the same effect as [`hide`](Self::hide).
    pub fn set_active(&mut self, active: bool, default_message: &str) {
        if active {
            self.show(None, default_message);
        } else {
            self.hide();
        }
    }

    /// Overwrites progress without validation.
    ///
    /// A positive value switches the current busy period to determinate.
    pub fn set_progress(&mut self, value: f64) {
        self.progress = value;
        if value > 0.0 {
            self.determinate = true;
        }
    }

    /// Overwrites the message regardless of activity.
    pub fn set_message(&mut self, message: &str) {
        message.clone_into(&mut self.message);
        self.message_stale = false;
    }
}

fn deserialize_progress<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

// ============================================================================
// Tests
// ============================================================================
