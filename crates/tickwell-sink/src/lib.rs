//! Persistence sinks for the tickwell pipeline.
//!
//! This crate provides the append-only writers ticks and bars end up in:
//!
//! - [`PersistenceSink`] - Capability trait shared by every backend
//! - [`CsvSink`] - Delimited rows in a file, header written once
//! - [`SqliteSink`] - One table per asset and schema in a SQLite database
//! - [`SinkSet`] - Fans writes out to zero or more sinks in sequence

#![doc(issue_tracker_base_url = "https://github.com/tickwell/tickwell/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod csv;
mod set;
mod sink;
mod sqlite;

pub use crate::csv::CsvSink;
pub use set::SinkSet;
pub use sink::{
    BAR_COLUMNS, PersistenceSink, SchemaKind, SinkError, TICK_COLUMNS, TIMESTAMP_FORMAT,
    format_timestamp, parse_timestamp,
};
pub use sqlite::SqliteSink;
