//! Configuration errors.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while validating a run configuration.
///
/// Every variant is fatal and is surfaced before the first fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Start date is after end date.
    #[error("Invalid date range: {start} > {end}")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },

    /// A date string did not match `YYYY-MM-DD`.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// An aggregation interval did not match `<integer><unit>`.
    #[error("Invalid interval '{input}': {reason}")]
    InvalidInterval {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The asset has no entry in the scaling table.
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// A required option was not supplied.
    #[error("Missing required option: {0}")]
    Missing(&'static str),

    /// A sink target could not be interpreted.
    #[error("Invalid sink target '{target}': {reason}")]
    InvalidSink {
        /// The rejected target.
        target: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The feed base URL is not an http(s) URL.
    #[error("Invalid feed URL '{0}', expected http:// or https://")]
    InvalidFeedUrl(String),

    /// An option held a value outside its accepted set.
    #[error("Invalid value '{value}' for {option}: {reason}")]
    InvalidValue {
        /// The option name.
        option: &'static str,
        /// The rejected value.
        value: String,
        /// Accepted values or why it was rejected.
        reason: String,
    },

    /// A configuration file could not be read or parsed.
    #[error("Cannot load config file '{path}': {reason}")]
    File {
        /// Path of the file.
        path: String,
        /// Underlying failure.
        reason: String,
    },
}
