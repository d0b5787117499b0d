//! Feed URL construction.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Base URL for the Dukascopy data feed.
pub const BASE_URL: &str = "https://datafeed.dukascopy.com/datafeed";

/// How the month path segment is numbered.
///
/// The live Dukascopy feed uses 0-indexed months (January = `00`), which is
/// the default. Some mirrors and older tooling use 1-indexed months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthIndexing {
    /// January is `00`.
    #[default]
    Zero,
    /// January is `01`.
    One,
}

impl std::str::FromStr for MonthIndexing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero" | "0" => Ok(Self::Zero),
            "one" | "1" => Ok(Self::One),
            _ => Err(format!("invalid month indexing '{s}', expected zero or one")),
        }
    }
}

/// Builds per-hour blob URLs for a feed host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUrl {
    base: String,
    months: MonthIndexing,
}

impl Default for FeedUrl {
    fn default() -> Self {
        Self::new(BASE_URL, MonthIndexing::Zero)
    }
}

impl FeedUrl {
    /// Creates a URL builder for `base`, e.g. `https://host/datafeed`.
    #[must_use]
    pub fn new(base: impl Into<String>, months: MonthIndexing) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            months,
        }
    }

    /// Returns the month numbering in use.
    #[must_use]
    pub const fn month_indexing(&self) -> MonthIndexing {
        self.months
    }

    /// Builds the URL for a specific hour's tick data.
    ///
    /// URL format: `{base}/{INSTRUMENT}/{YEAR}/{MONTH}/{DAY}/{HOUR}h_ticks.bi5`
    ///
    /// # Example
    ///
    /// ```
    /// use tickwell_fetch::url::FeedUrl;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let hour = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
    /// let url = FeedUrl::default().tick_url("eurusd", hour);
    /// assert_eq!(url, "https://datafeed.dukascopy.com/datafeed/EURUSD/2024/00/15/12h_ticks.bi5");
    /// ```
    #[must_use]
    pub fn tick_url(&self, instrument: &str, hour: DateTime<Utc>) -> String {
        let month = match self.months {
            MonthIndexing::Zero => hour.month0(),
            MonthIndexing::One => hour.month(),
        };
        format!(
            "{}/{}/{}/{:02}/{:02}/{:02}h_ticks.bi5",
            self.base,
            instrument.to_uppercase(),
            hour.year(),
            month,
            hour.day(),
            hour.hour()
        )
    }
}
