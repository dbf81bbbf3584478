//! Terminal rendering of the busy overlay.
//!
//! Draws the current view on a single line, redrawing on every store change
//! and on each spinner frame. The line is cleared when the overlay hides.

use std::io::Write;
use std::time::Duration;

use lumina_core::OverlayMount;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

const SPINNER_PERIOD: Duration = Duration::from_millis(100);

/// ANSI: return to column 0 and erase the line.
const CLEAR_LINE: &str = "\r\x1b[2K";

/// A running terminal overlay.
pub struct TerminalOverlay {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TerminalOverlay {
    /// Starts drawing `mount` to `out`.
    pub fn spawn<W>(mount: OverlayMount, out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(draw_loop(mount, out, stopped));
        Self {
            stop: Some(stop),
            task,
        }
    }

    /// Clears the line and releases the overlay slot.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            // the task may already be gone
            let _ = stop.send(());
        }
        if let Err(e) = self.task.await {
            debug!(error = %e, "Terminal overlay task ended abnormally");
        }
    }
}

async fn draw_loop<W: Write>(
    mount: OverlayMount,
    mut out: W,
    mut stopped: oneshot::Receiver<()>,
) {
    let mut changes = mount.subscribe();
    let mut spinner = interval(SPINNER_PERIOD);
    let mut frame = 0usize;
    let mut last = String::new();

    loop {
        tokio::select! {
            _ = &mut stopped => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = spinner.tick() => frame = frame.wrapping_add(1),
        }

        let line = mount.render(frame);
        if line != last {
            draw(&mut out, &line);
            last = line;
        }
    }

    if !last.is_empty() {
        draw(&mut out, "");
    }
}

fn draw<W: Write>(out: &mut W, line: &str) {
    if let Err(e) = write!(out, "{CLEAR_LINE}{line}").and_then(|()| out.flush()) {
        debug!(error = %e, "Failed to draw overlay");
    }
}
