//! Streaming tick-to-bar aggregation.

use chrono::{DateTime, Utc};
use tickwell_types::{Interval, Tick};

use crate::AggregatedBar;

/// Streaming bar aggregator.
///
/// Holds at most one open bar. A tick whose bucket differs from the open
/// bar's closes that bar and opens a new one, so buckets without ticks never
/// produce a bar. Ticks must arrive in non-decreasing timestamp order.
#[derive(Debug, Clone)]
pub struct BarAggregator {
    interval: Interval,
    current: Option<AggregatedBar>,
}

impl BarAggregator {
    /// Creates an empty aggregator for the given interval.
    #[must_use]
    pub const fn new(interval: Interval) -> Self {
        Self {
            interval,
            current: None,
        }
    }

    /// Returns the interval being aggregated to.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Returns the open bar, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&AggregatedBar> {
        self.current.as_ref()
    }

    /// Returns true if a bar is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Processes a tick, potentially emitting a completed bar.
    ///
    /// Returns `Some(bar)` when this tick starts a new bucket and the
    /// previous bar is complete, `None` otherwise.
    pub fn process(&mut self, tick: &Tick) -> Option<AggregatedBar> {
        let bucket = self.bucket_for(tick.timestamp);

        match self.current.as_mut() {
            Some(bar) if bar.interval_start == bucket => {
                bar.update(tick);
                None
            }
            _ => self.current.replace(AggregatedBar::open(bucket, tick)),
        }
    }

    /// Closes and returns the open bar, leaving the aggregator empty.
    pub fn flush(&mut self) -> Option<AggregatedBar> {
        self.current.take()
    }

    fn bucket_for(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        self.interval.bucket_start(timestamp)
    }
}
