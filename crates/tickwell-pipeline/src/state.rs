//! Run state and summary counters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tickwell_aggregate::{AggregatedBar, BarAggregator};
use tickwell_types::{Interval, Tick, Window, WindowCursor};

/// Mutable state of one run, owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineState {
    cursor: WindowCursor,
    aggregator: Option<BarAggregator>,
    write_from: Option<DateTime<Utc>>,
    fetch_index: usize,
    consumed: usize,
    bytes_downloaded: u64,
}

impl PipelineState {
    /// Creates state for windows `start..=end`, aggregating when `interval`
    /// is set.
    #[must_use]
    pub fn new(
        asset: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Option<Interval>,
    ) -> Self {
        Self {
            cursor: WindowCursor::new(asset, start, end),
            aggregator: interval.map(BarAggregator::new),
            write_from: None,
            fetch_index: 0,
            consumed: 0,
            bytes_downloaded: 0,
        }
    }

    /// Drops ticks stamped before `from`. A resumed bar run fetches the
    /// whole hour holding its last bucket but starts that bucket afresh.
    #[must_use]
    pub fn with_write_from(mut self, from: Option<DateTime<Utc>>) -> Self {
        self.write_from = from;
        self
    }

    /// Returns false for ticks before the write boundary.
    #[must_use]
    pub fn accepts(&self, tick: &Tick) -> bool {
        self.write_from.is_none_or(|from| tick.timestamp >= from)
    }

    /// Takes the next window and counts it as consumed.
    pub fn next_window(&mut self) -> Option<Window> {
        let window = self.cursor.next()?;
        self.fetch_index += 1;
        self.consumed += 1;
        Some(window)
    }

    /// Skips the rest of `window`'s day. Returns how many further windows
    /// were dropped from the range.
    pub fn skip_rest_of_day(&mut self, window: &Window) -> usize {
        let before = self.cursor.remaining();
        self.cursor.skip_rest_of_day(window);
        let skipped = before - self.cursor.remaining();
        self.consumed += skipped;
        skipped
    }

    /// Pushes the end boundary forward (live tail).
    pub fn extend_to(&mut self, end: DateTime<Utc>) {
        self.cursor.extend_to(end);
    }

    /// Records downloaded body bytes.
    pub fn add_bytes(&mut self, bytes: usize) {
        self.bytes_downloaded += bytes as u64;
    }

    /// Returns the aggregator when bars are being built.
    pub fn aggregator_mut(&mut self) -> Option<&mut BarAggregator> {
        self.aggregator.as_mut()
    }

    /// Returns the open bar, if any.
    #[must_use]
    pub fn current_bar(&self) -> Option<&AggregatedBar> {
        self.aggregator.as_ref().and_then(BarAggregator::current)
    }

    /// Closes the open bar, if any.
    pub fn flush_bar(&mut self) -> Option<AggregatedBar> {
        self.aggregator.as_mut().and_then(BarAggregator::flush)
    }

    /// Number of fetches attempted.
    #[must_use]
    pub const fn fetch_index(&self) -> usize {
        self.fetch_index
    }

    /// Window slots consumed so far, fetched or skipped.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    /// Windows still ahead of the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Consumed plus remaining.
    #[must_use]
    pub fn total(&self) -> usize {
        self.consumed + self.cursor.remaining()
    }

    /// Cumulative body bytes downloaded.
    #[must_use]
    pub const fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded
    }

    /// Current inclusive end boundary.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.cursor.end()
    }
}

/// Counters reported when a run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Latest persisted timestamp the run continued from.
    pub resumed_from: Option<DateTime<Utc>>,
    /// Windows fetched.
    pub windows_fetched: usize,
    /// Windows skipped because an earlier hour of their day was missing.
    pub windows_skipped: usize,
    /// 404 responses.
    pub not_found: usize,
    /// Non-200 responses and transport failures.
    pub transient_errors: usize,
    /// Bodies that failed to decompress.
    pub decompression_errors: usize,
    /// 200 responses with an empty body.
    pub empty_blobs: usize,
    /// Blobs whose length was not a multiple of the record size.
    pub truncated_blobs: usize,
    /// Text lines stripped from blob heads.
    pub banner_lines: usize,
    /// Records rejected by the decoder.
    pub malformed_records: usize,
    /// Ticks decoded.
    pub ticks: u64,
    /// Decoded ticks dropped because they precede the resume point.
    pub ticks_before_resume: u64,
    /// Bars written.
    pub bars: u64,
    /// Body bytes downloaded.
    pub bytes_downloaded: u64,
    /// Completed live-tail sleeps.
    pub tail_cycles: usize,
    /// True if the run stopped on a cancellation request.
    pub cancelled: bool,
}

impl RunSummary {
    /// Number of windows that did not yield data because of a fault.
    #[must_use]
    pub const fn faulted_windows(&self) -> usize {
        self.not_found + self.transient_errors + self.decompression_errors
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} windows fetched, {} ticks, {} bars, {} bytes",
            self.windows_fetched, self.ticks, self.bars, self.bytes_downloaded
        )?;
        if self.faulted_windows() > 0 {
            write!(
                f,
                " ({} not found, {} transient, {} decompression)",
                self.not_found, self.transient_errors, self.decompression_errors
            )?;
        }
        if self.malformed_records > 0 {
            write!(f, ", {} malformed records", self.malformed_records)?;
        }
        if self.cancelled {
            write!(f, ", cancelled")?;
        }
        Ok(())
    }
}
