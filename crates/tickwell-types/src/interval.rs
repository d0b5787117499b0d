//! Aggregation interval definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::ConfigError;

/// Width of an aggregation bucket, parsed from `<integer><unit>`.
///
/// Units are `s`, `m`, `h` and `d`. Buckets are aligned to multiples of the
/// width since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    millis: i64,
    amount: u32,
    unit: char,
}

impl Interval {
    /// Creates an interval of `amount` units.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is zero or the unit is not one of
    /// `s`, `m`, `h`, `d`.
    pub fn new(amount: u32, unit: char) -> Result<Self, ConfigError> {
        let input = || format!("{amount}{unit}");
        if amount == 0 {
            return Err(ConfigError::InvalidInterval {
                input: input(),
                reason: "quantity must be greater than zero",
            });
        }
        let unit_ms: i64 = match unit {
            's' => 1_000,
            'm' => 60_000,
            'h' => 3_600_000,
            'd' => 86_400_000,
            _ => {
                return Err(ConfigError::InvalidInterval {
                    input: input(),
                    reason: "unit must be one of s, m, h, d",
                });
            }
        };
        Ok(Self {
            millis: i64::from(amount) * unit_ms,
            amount,
            unit,
        })
    }

    /// Returns the width in milliseconds.
    #[must_use]
    pub const fn millis(&self) -> i64 {
        self.millis
    }

    /// Returns the start of the bucket containing `timestamp`.
    ///
    /// `bucket = t - (t mod d)` on milliseconds since the epoch, floored so
    /// that pre-epoch timestamps land in the bucket below them.
    #[must_use]
    pub fn bucket_start(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let ms = timestamp.timestamp_millis();
        let start = ms - ms.rem_euclid(self.millis);
        DateTime::from_timestamp_millis(start).unwrap_or(timestamp)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}

impl FromStr for Interval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason| ConfigError::InvalidInterval {
            input: s.to_string(),
            reason,
        };

        let Some(unit) = s.chars().last() else {
            return Err(invalid("expected <integer><unit>, e.g. 1m"));
        };
        let amount = &s[..s.len() - unit.len_utf8()];
        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("quantity must be a positive integer"));
        }
        let amount: u32 = amount.parse().map_err(|_| invalid("quantity is too large"))?;

        Self::new(amount, unit.to_ascii_lowercase()).map_err(|_| {
            if amount == 0 {
                invalid("quantity must be greater than zero")
            } else {
                invalid("unit must be one of s, m, h, d")
            }
        })
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
