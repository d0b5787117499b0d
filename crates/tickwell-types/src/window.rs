//! Date ranges and hourly fetch windows.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Timelike, Utc};

use crate::ConfigError;

const HOUR_SECS: i64 = 3_600;

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDate`] if the string is malformed.
pub fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDate(s.to_string()))
}

/// Truncates a timestamp to the start of its UTC hour.
#[must_use]
pub fn floor_to_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    let secs = dt.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(HOUR_SECS), 0).unwrap_or(dt)
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// A range of dates for data retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Start date (inclusive).
    pub start: NaiveDate,
    /// End date (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new date range, validating that start <= end.
    ///
    /// # Errors
    ///
    /// Returns an error if start > end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses a range from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// Returns an error if either date is malformed or start > end.
    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Creates a date range for a single day.
    #[must_use]
    pub const fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Returns the first window start (`start 00:00`).
    #[must_use]
    pub fn first_hour(&self) -> DateTime<Utc> {
        day_start(self.start)
    }

    /// Returns the last window start (`end 23:00`).
    #[must_use]
    pub fn last_hour(&self) -> DateTime<Utc> {
        day_start(self.end) + TimeDelta::hours(23)
    }

    /// Returns a cursor over every hourly window in the range.
    pub fn windows(&self, asset: impl Into<String>) -> WindowCursor {
        WindowCursor::new(asset, self.first_hour(), self.last_hour())
    }

    /// Returns the total number of hours in the range.
    #[must_use]
    pub fn total_hours(&self) -> usize {
        self.total_days() * 24
    }

    /// Returns the total number of days in the range.
    #[must_use]
    pub fn total_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// One hour of remote data for one asset; the unit of fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Asset symbol the window belongs to.
    pub asset: String,
    /// Start of the UTC hour.
    pub hour_start: DateTime<Utc>,
}

impl Window {
    /// Creates a new window.
    #[must_use]
    pub fn new(asset: impl Into<String>, hour_start: DateTime<Utc>) -> Self {
        Self {
            asset: asset.into(),
            hour_start,
        }
    }

    /// Returns the hour of day (0-23) of the window.
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.hour_start.hour()
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.asset, self.hour_start.format("%Y-%m-%d %H:00"))
    }
}

/// Lazy, restartable iterator over hourly windows up to an inclusive end hour.
///
/// Cloning a cursor yields an independent sequence from the same position.
/// The end boundary can be pushed forward with [`WindowCursor::extend_to`].
#[derive(Debug, Clone)]
pub struct WindowCursor {
    asset: String,
    next: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl WindowCursor {
    /// Creates a cursor yielding `start..=end`, both truncated to the hour.
    pub fn new(asset: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            asset: asset.into(),
            next: floor_to_hour(start),
            end: floor_to_hour(end),
        }
    }

    /// Returns the start of the next window to be yielded.
    #[must_use]
    pub const fn next_hour(&self) -> DateTime<Utc> {
        self.next
    }

    /// Returns the inclusive end boundary.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the number of windows left to yield.
    #[must_use]
    pub fn remaining(&self) -> usize {
        if self.next > self.end {
            return 0;
        }
        ((self.end - self.next).num_hours() + 1) as usize
    }

    /// Moves the end boundary forward. An earlier boundary is ignored.
    pub fn extend_to(&mut self, end: DateTime<Utc>) {
        let end = floor_to_hour(end);
        if end > self.end {
            self.end = end;
        }
    }

    /// Skips the rest of the calendar day that `window` belongs to.
    ///
    /// The next window yielded starts at hour 0 of the following day. Returns
    /// the number of hourly slots `window` stands for, itself included,
    /// which is `24 - window.hour()`.
    pub fn skip_rest_of_day(&mut self, window: &Window) -> usize {
        let next_day = day_start(window.hour_start.date_naive()) + TimeDelta::days(1);
        if next_day > self.next {
            self.next = next_day;
        }
        (24 - window.hour()) as usize
    }
}

impl Iterator for WindowCursor {
    type Item = Window;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end {
            return None;
        }

        let window = Window::new(self.asset.clone(), self.next);
        self.next += TimeDelta::hours(1);
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let hours = self.remaining();
        (hours, Some(hours))
    }
}

impl ExactSizeIterator for WindowCursor {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_new() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 1, 31));
        assert_eq!(range.total_days(), 31);
    }

    #[test]
    fn test_date_range_invalid() {
        let err = DateRange::new(date(2024, 1, 31), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRange { .. }));
    }

    #[test]
    fn test_parse_malformed_date() {
        assert_eq!(
            DateRange::parse("2024-13-01", "2024-12-01").unwrap_err(),
            ConfigError::InvalidDate("2024-13-01".to_string())
        );
        assert!(DateRange::parse("01/02/2024", "2024-01-03").is_err());
        assert!(DateRange::parse("2024-01-02", "2024-01-03").is_ok());
    }

    #[test]
    fn test_windows_cover_whole_days() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 2)).unwrap();
        let windows: Vec<_> = range.windows("EURUSD").collect();

        assert_eq!(windows.len(), range.total_hours());
        assert_eq!(windows[0].hour_start, range.first_hour());
        assert_eq!(windows[0].hour(), 0);
        assert_eq!(windows[47].hour(), 23);
        assert_eq!(windows[47].hour_start.day(), 2);
        assert!(windows.iter().all(|w| w.asset == "EURUSD"));
        assert!(windows.windows(2).all(|p| p[0].hour_start < p[1].hour_start));
    }

    #[test]
    fn test_cursor_is_restartable() {
        let range = DateRange::single_day(date(2024, 3, 10));
        let mut cursor = range.windows("XAUUSD");
        cursor.next();
        let snapshot = cursor.clone();

        let rest: Vec<_> = cursor.collect();
        let again: Vec<_> = snapshot.collect();
        assert_eq!(rest, again);
        assert_eq!(rest.len(), 23);
    }

    #[test]
    fn test_skip_rest_of_day() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 2)).unwrap();
        let mut cursor = range.windows("EURUSD");
        let window = cursor.nth(5).unwrap();
        assert_eq!(window.hour(), 5);

        let consumed = cursor.skip_rest_of_day(&window);
        assert_eq!(consumed, 19);

        let next = cursor.next().unwrap();
        assert_eq!(next.hour_start.day(), 2);
        assert_eq!(next.hour(), 0);
    }

    #[test]
    fn test_skip_on_last_day_exhausts() {
        let mut cursor = DateRange::single_day(date(2024, 1, 1)).windows("EURUSD");
        let window = cursor.next().unwrap();
        assert_eq!(cursor.skip_rest_of_day(&window), 24);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_extend_to() {
        let mut cursor = DateRange::single_day(date(2024, 1, 1)).windows("EURUSD");
        assert_eq!(cursor.by_ref().count(), 24);

        let later = Utc.with_ymd_and_hms(2024, 1, 2, 2, 41, 7).unwrap();
        cursor.extend_to(later);
        assert_eq!(cursor.remaining(), 3);
        assert_eq!(cursor.len(), 3);

        cursor.extend_to(later - TimeDelta::days(3));
        assert_eq!(cursor.end(), floor_to_hour(later));
    }

    #[test]
    fn test_floor_to_hour() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 14, 37, 45).unwrap();
        assert_eq!(
            floor_to_hour(dt),
            Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
        );
        assert_eq!(floor_to_hour(floor_to_hour(dt)), floor_to_hour(dt));
    }
}
