//! Progress bar and interactive cancellation for the CLI.

use crossterm::event::{self, Event, KeyCode};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::time::Duration;
use tickwell_lib::{CancellationProbe, ProgressObserver, ProgressUpdate, RunSummary, Window};

/// Draws window progress with indicatif.
pub(crate) struct BarProgress {
    bar: ProgressBar,
    label: String,
}

impl BarProgress {
    /// Creates a bar labelled with `label`; hidden unless `visible`.
    pub(crate) fn new(label: String, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} hours ({percent}%, eta {eta}) {msg}")
                .expect("Invalid progress template")
                .progress_chars("=>-"),
        );
        Self { bar, label }
    }
}

impl ProgressObserver for BarProgress {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message(self.label.clone());
    }

    fn on_window(&self, window: &Window, update: ProgressUpdate) {
        self.bar.set_position(update.done as u64);
        self.bar.set_message(format!(
            "{} {} ({})",
            self.label,
            window.hour_start.format("%Y-%m-%d %H:00"),
            HumanBytes(update.bytes)
        ));
    }

    fn on_tail_wait(&self, wait: Duration) {
        self.bar.set_message(format!(
            "{} up to date, next poll in {}s (q + Enter to stop)",
            self.label,
            wait.as_secs()
        ));
    }

    fn on_extend(&self, update: ProgressUpdate) {
        self.bar.set_length(update.total as u64);
        self.bar.set_position(update.done as u64);
    }

    fn on_finish(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

/// Cancels when `q` or Esc is read from the terminal.
///
/// The terminal stays in cooked mode, so the key is seen after Enter.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct KeypressProbe;

impl CancellationProbe for KeypressProbe {
    fn is_cancelled(&self) -> bool {
        let mut cancelled = false;
        while matches!(event::poll(Duration::ZERO), Ok(true)) {
            match event::read() {
                Ok(Event::Key(key))
                    if matches!(key.code, KeyCode::Char('q' | 'Q') | KeyCode::Esc) =>
                {
                    cancelled = true;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        cancelled
    }
}
