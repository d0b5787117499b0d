//! Progress reporting hooks.

use std::time::Duration;
use tickwell_types::Window;

use crate::RunSummary;

/// Position of the run after a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Window slots consumed, fetched or skipped.
    pub done: usize,
    /// Consumed plus remaining slots; grows in live-tail mode.
    pub total: usize,
    /// Cumulative body bytes downloaded.
    pub bytes: u64,
}

/// Receives progress events from the orchestrator.
///
/// Every method has an empty default so observers implement only what
/// they draw.
pub trait ProgressObserver: Send + Sync {
    /// Called once before the first window.
    fn on_start(&self, _total: usize) {}

    /// Called after each window is handled.
    fn on_window(&self, _window: &Window, _update: ProgressUpdate) {}

    /// Called before a live-tail sleep.
    fn on_tail_wait(&self, _wait: Duration) {}

    /// Called when the range grows in live-tail mode.
    fn on_extend(&self, _update: ProgressUpdate) {}

    /// Called once when the run ends without a fatal error.
    fn on_finish(&self, _summary: &RunSummary) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
