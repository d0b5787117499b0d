//! Pipeline errors and per-window faults.

use thiserror::Error;
use tickwell_fetch::{DecodeError, DecompressError, FetchError};
use tickwell_sink::SinkError;
use tickwell_types::ConfigError;

/// Fatal errors that end a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The configuration was rejected before any fetch.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A sink failed. Rows already written are left as they are.
    #[error("sink write failed: {0}")]
    Sink(#[from] SinkError),
}

/// Recoverable problems with a single window or record.
///
/// Faults are logged and counted; the run moves on.
#[derive(Error, Debug)]
pub enum WindowFault {
    /// The feed has no blob for the hour. The rest of the day is skipped.
    #[error("not found")]
    NotFound,

    /// Non-200 status or transport failure. The hour is skipped.
    #[error("transient fetch error: {0}")]
    TransientFetch(String),

    /// The blob could not be decompressed. The hour is skipped.
    #[error("decompression failed: {0}")]
    Decompression(#[from] DecompressError),

    /// One record was rejected. Only that tick is skipped.
    #[error("malformed record: {0}")]
    MalformedRecord(#[from] DecodeError),
}

impl From<FetchError> for WindowFault {
    fn from(err: FetchError) -> Self {
        Self::TransientFetch(err.to_string())
    }
}

impl WindowFault {
    /// Returns a short label for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::TransientFetch(_) => "transient_fetch",
            Self::Decompression(_) => "decompression",
            Self::MalformedRecord(_) => "malformed_record",
        }
    }
}
