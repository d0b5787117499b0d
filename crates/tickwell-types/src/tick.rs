//! Tick data representation.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A single tick representing a quote update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Timestamp of the tick (UTC, millisecond precision).
    pub timestamp: DateTime<Utc>,
    /// Ask (offer) price.
    pub ask: f64,
    /// Bid price.
    pub bid: f64,
    /// Volume available at the ask price.
    pub ask_volume: f32,
    /// Volume available at the bid price.
    pub bid_volume: f32,
}

impl Tick {
    /// Creates a new tick.
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        ask: f64,
        bid: f64,
        ask_volume: f32,
        bid_volume: f32,
    ) -> Self {
        Self {
            timestamp,
            ask,
            bid,
            ask_volume,
            bid_volume,
        }
    }
}

/// Raw tick as read from a bi5 record (before price scaling).
///
/// The bi5 format stores ticks as 20 bytes in big-endian order:
/// - `u32`: milliseconds offset from hour start
/// - `u32`: ask price (raw, needs division by decimal factor)
/// - `u32`: bid price (raw, needs division by decimal factor)
/// - `f32`: ask volume
/// - `f32`: bid volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTick {
    /// Milliseconds offset from the hour start.
    pub ms_offset: u32,
    /// Raw ask price (needs division by decimal factor).
    pub ask_raw: u32,
    /// Raw bid price (needs division by decimal factor).
    pub bid_raw: u32,
    /// Ask volume.
    pub ask_volume: f32,
    /// Bid volume.
    pub bid_volume: f32,
}

impl RawTick {
    /// Size in bytes of a raw tick record.
    pub const SIZE: usize = 20;

    /// Number of milliseconds in the hour a blob covers.
    pub const HOUR_MS: u32 = 3_600_000;

    /// Creates a new raw tick.
    #[must_use]
    pub const fn new(
        ms_offset: u32,
        ask_raw: u32,
        bid_raw: u32,
        ask_volume: f32,
        bid_volume: f32,
    ) -> Self {
        Self {
            ms_offset,
            ask_raw,
            bid_raw,
            ask_volume,
            bid_volume,
        }
    }

    /// Returns true if the offset falls inside the hour the blob represents.
    #[must_use]
    pub const fn is_within_hour(&self) -> bool {
        self.ms_offset < Self::HOUR_MS
    }

    /// Scales the raw tick using the instrument's decimal factor.
    ///
    /// For example, EUR/USD has a decimal factor of 100,000, so a raw price
    /// of 112345 becomes 1.12345.
    #[must_use]
    pub fn normalize(self, hour_start: DateTime<Utc>, decimal_factor: f64) -> Tick {
        let timestamp = hour_start + TimeDelta::milliseconds(i64::from(self.ms_offset));
        Tick {
            timestamp,
            ask: f64::from(self.ask_raw) / decimal_factor,
            bid: f64::from(self.bid_raw) / decimal_factor,
            ask_volume: self.ask_volume,
            bid_volume: self.bid_volume,
        }
    }
}
