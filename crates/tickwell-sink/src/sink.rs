//! Sink abstraction shared by every persistence backend.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use tickwell_aggregate::AggregatedBar;
use tickwell_types::{Interval, Tick};

/// Column names for raw tick output.
pub const TICK_COLUMNS: [&str; 5] = ["Timestamp", "Ask", "Bid", "AskVolume", "BidVolume"];

/// Column names for bar output.
pub const BAR_COLUMNS: [&str; 11] = [
    "Timestamp",
    "OpenAsk",
    "HighAsk",
    "LowAsk",
    "CloseAsk",
    "OpenBid",
    "HighBid",
    "LowBid",
    "CloseBid",
    "TotalAskVolume",
    "TotalBidVolume",
];

/// Timestamp layout used in text output, UTC with milliseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Shape of the rows a sink receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// One row per tick.
    Ticks,
    /// One row per bar of the given width.
    Bars(Interval),
}

impl SchemaKind {
    /// Returns the output columns for this schema.
    #[must_use]
    pub const fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Ticks => &TICK_COLUMNS,
            Self::Bars(_) => &BAR_COLUMNS,
        }
    }

    /// Returns the kind of row this schema holds, `"tick"` or `"bar"`.
    #[must_use]
    pub const fn row_kind(&self) -> &'static str {
        match self {
            Self::Ticks => "tick",
            Self::Bars(_) => "bar",
        }
    }

    /// Returns the comma-joined header line, without a newline.
    #[must_use]
    pub fn header(&self) -> String {
        self.columns().join(",")
    }

    /// Returns the relational table name for `symbol`.
    ///
    /// Ticks go to `{SYMBOL}_tickdata`, bars to `{SYMBOL}_bars_{interval}`.
    #[must_use]
    pub fn table_name(&self, symbol: &str) -> String {
        let symbol = symbol.to_uppercase();
        match self {
            Self::Ticks => format!("{symbol}_tickdata"),
            Self::Bars(interval) => format!("{symbol}_bars_{interval}"),
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ticks => write!(f, "ticks"),
            Self::Bars(interval) => write!(f, "{interval} bars"),
        }
    }
}

/// Errors raised by sinks. Every one of them is fatal to a run.
#[derive(Error, Debug)]
pub enum SinkError {
    /// I/O error on a file target.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The existing target holds a different schema.
    #[error("{target} has header '{found}', expected '{expected}'")]
    SchemaMismatch {
        /// Target description.
        target: String,
        /// Header found in the target.
        found: String,
        /// Header this run writes.
        expected: String,
    },

    /// A persisted row could not be read back.
    #[error("{target}: cannot read timestamp from '{row}'")]
    Corrupt {
        /// Target description.
        target: String,
        /// Offending row.
        row: String,
    },

    /// Rows were written before `initialize`.
    #[error("{0} was used before initialize")]
    NotInitialized(String),

    /// The tick and bar shape do not match the initialized schema.
    #[error("{target} was initialized for {schema}, cannot append {row}")]
    WrongRowKind {
        /// Target description.
        target: String,
        /// Schema the sink was initialized with.
        schema: SchemaKind,
        /// Kind of row that was offered.
        row: &'static str,
    },
}

/// Append-only destination for ticks or bars.
///
/// A sink is initialized once per run with the schema it will receive. When
/// a run starts from its configured start instead of resuming, the pipeline
/// calls [`reset`](Self::reset) after `initialize` to discard earlier rows.
pub trait PersistenceSink: Send {
    /// Short description for logs, e.g. the file path.
    fn describe(&self) -> String;

    /// Opens or creates the target for `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be opened or already holds a
    /// different schema.
    fn initialize(&mut self, schema: SchemaKind) -> Result<(), SinkError>;

    /// Discards all persisted rows, leaving an empty target with its schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be truncated or recreated.
    fn reset(&mut self) -> Result<(), SinkError>;

    /// Appends one tick row.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append_tick(&mut self, tick: &Tick) -> Result<(), SinkError>;

    /// Appends one bar row.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append_bar(&mut self, bar: &AggregatedBar) -> Result<(), SinkError>;

    /// Returns the timestamp of the latest persisted row, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be read.
    fn last_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, SinkError>;

    /// Removes every row stamped at or after `from` and returns how many
    /// were removed. Pending writes are flushed first.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be read or rewritten.
    fn truncate_from(&mut self, from: DateTime<Utc>) -> Result<usize, SinkError>;

    /// Makes everything appended so far durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or commit fails.
    fn flush(&mut self) -> Result<(), SinkError>;
}

impl<S: PersistenceSink + ?Sized> PersistenceSink for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn initialize(&mut self, schema: SchemaKind) -> Result<(), SinkError> {
        (**self).initialize(schema)
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        (**self).reset()
    }

    fn append_tick(&mut self, tick: &Tick) -> Result<(), SinkError> {
        (**self).append_tick(tick)
    }

    fn append_bar(&mut self, bar: &AggregatedBar) -> Result<(), SinkError> {
        (**self).append_bar(bar)
    }

    fn last_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, SinkError> {
        (**self).last_timestamp()
    }

    fn truncate_from(&mut self, from: DateTime<Utc>) -> Result<usize, SinkError> {
        (**self).truncate_from(from)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

/// Formats a timestamp the way text sinks store it.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a timestamp written by [`format_timestamp`].
///
/// Also accepts `YYYY-MM-DD HH:MM:SS[.fff]` without a zone, read as UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
