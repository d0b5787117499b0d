//! Aggregated bid/ask bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tickwell_types::Tick;

/// One bucket's worth of ticks reduced to OHLC on both sides of the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBar {
    /// Bucket start, an exact multiple of the interval since the epoch.
    pub interval_start: DateTime<Utc>,
    /// First ask in the bucket.
    pub open_ask: f64,
    /// Highest ask in the bucket.
    pub high_ask: f64,
    /// Lowest ask in the bucket.
    pub low_ask: f64,
    /// Last ask in the bucket.
    pub close_ask: f64,
    /// First bid in the bucket.
    pub open_bid: f64,
    /// Highest bid in the bucket.
    pub high_bid: f64,
    /// Lowest bid in the bucket.
    pub low_bid: f64,
    /// Last bid in the bucket.
    pub close_bid: f64,
    /// Sum of ask volumes.
    pub total_ask_volume: f64,
    /// Sum of bid volumes.
    pub total_bid_volume: f64,
    /// Number of ticks folded into the bar. Not persisted.
    #[serde(skip)]
    pub tick_count: u32,
}

impl AggregatedBar {
    /// Opens a bar at `interval_start` from its first tick.
    #[must_use]
    pub fn open(interval_start: DateTime<Utc>, tick: &Tick) -> Self {
        Self {
            interval_start,
            open_ask: tick.ask,
            high_ask: tick.ask,
            low_ask: tick.ask,
            close_ask: tick.ask,
            open_bid: tick.bid,
            high_bid: tick.bid,
            low_bid: tick.bid,
            close_bid: tick.bid,
            total_ask_volume: f64::from(tick.ask_volume),
            total_bid_volume: f64::from(tick.bid_volume),
            tick_count: 1,
        }
    }

    /// Folds a later tick of the same bucket into the bar.
    pub fn update(&mut self, tick: &Tick) {
        self.high_ask = self.high_ask.max(tick.ask);
        self.low_ask = self.low_ask.min(tick.ask);
        self.close_ask = tick.ask;
        self.high_bid = self.high_bid.max(tick.bid);
        self.low_bid = self.low_bid.min(tick.bid);
        self.close_bid = tick.bid;
        self.total_ask_volume += f64::from(tick.ask_volume);
        self.total_bid_volume += f64::from(tick.bid_volume);
        self.tick_count += 1;
    }
}
