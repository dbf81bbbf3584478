//! What an overlay shows for a given busy state.
//!
//! [`OverlayView`] is the whole decision: hidden, a spinner, or a percentage.
//! [`Layout`] says whether the overlay covers the client and blocks input.
//! Rendering surfaces (terminal, remote clients) only translate a view into
//! pixels or characters.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::state::BusyState;
use crate::store::BusyStore;

/// Cells in the text progress bar.
const BAR_WIDTH: usize = 20;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// How the overlay is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Covers the whole client and swallows input.
    #[default]
    Fullscreen,
    /// Fills only the content area; the rest of the client stays usable.
    Inline,
}

impl Layout {
    /// Returns `true` if a visible overlay in this layout blocks input.
    #[must_use]
    pub const fn blocks_input(self) -> bool {
        matches!(self, Self::Fullscreen)
    }
}

/// The presentation decision for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayView {
    /// Nothing is rendered.
    Hidden,
    /// Spinner with the message.
    Indeterminate {
        /// Text shown under the spinner.
        message: String,
    },
    /// Progress bar with `"{percent}% complete"` and the message.
    Determinate {
        /// Text shown next to the percentage.
        message: String,
        /// Rounded progress, exactly as reported.
        percent: i64,
    },
}

impl OverlayView {
    /// Picks the view for a snapshot.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumina_core::{BusyState, OverlayView};
    ///
    /// let mut state = BusyState::default();
    /// assert_eq!(OverlayView::from_state(&state), OverlayView::Hidden);
    ///
    /// state.show(Some("Uploading..."), "Loading...");
    /// state.set_progress(41.6);
    /// assert_eq!(
    ///     OverlayView::from_state(&state),
    ///     OverlayView::Determinate { message: "Uploading...".to_string(), percent: 42 }
    /// );
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_state(state: &BusyState) -> Self {
        if !state.active {
            return Self::Hidden;
        }

        let message = state.message.clone();
        if state.determinate {
            Self::Determinate {
                message,
                percent: state.progress.round() as i64,
            }
        } else {
            Self::Indeterminate { message }
        }
    }

    /// Returns `true` unless the view is [`OverlayView::Hidden`].
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

/// Renders a view as a single terminal line.
///
/// `frame` advances the spinner; the bar fill is clamped to `0..=100` for
/// drawing while the printed percentage is left as reported. A hidden view
/// renders as an empty string.
#[must_use]
pub fn render_text(view: &OverlayView, layout: Layout, frame: usize) -> String {
    let body = match view {
        OverlayView::Hidden => return String::new(),
        OverlayView::Determinate { message, percent } => {
            let filled = usize::try_from((*percent).clamp(0, 100)).unwrap_or(0) * BAR_WIDTH / 100;
            format!(
                "[{}{}] {percent}% complete  {message}",
                "█".repeat(filled),
                "░".repeat(BAR_WIDTH - filled)
            )
        }
        OverlayView::Indeterminate { message } => {
            let spinner = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
            let dots: String = (0..3)
                .map(|i| if i == frame % 3 { '●' } else { '·' })
                .collect();
            format!("{spinner} {message} {dots}")
        }
    };

    if layout.blocks_input() {
        format!("[blocking] {body}")
    } else {
        body
    }
}

/// The single overlay attached to a store.
///
/// Obtained from [`BusyStore::mount_overlay`]; dropping it frees the slot so
/// another overlay can be mounted.
#[derive(Debug)]
pub struct OverlayMount {
    store: BusyStore,
    layout: Layout,
}

impl OverlayMount {
    pub(crate) const fn new(store: BusyStore, layout: Layout) -> Self {
        Self { store, layout }
    }

    /// The layout chosen at mount time.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// The view for the current snapshot.
    #[must_use]
    pub fn view(&self) -> OverlayView {
        OverlayView::from_state(&self.store.snapshot())
    }

    /// Returns `true` while the overlay is visible and swallows input.
    #[must_use]
    pub fn blocks_input(&self) -> bool {
        self.layout.blocks_input() && self.store.is_active()
    }

    /// Renders the current snapshot.
    #[must_use]
    pub fn render(&self, frame: usize) -> String {
        render_text(&self.view(), self.layout, frame)
    }

    /// Subscribes to the snapshots this overlay renders.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BusyState> {
        self.store.subscribe()
    }
}

impl Drop for OverlayMount {
    fn drop(&mut self) {
        self.store.release_overlay();
    }
}
