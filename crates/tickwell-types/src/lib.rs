//! Core types for the tickwell tick ingestion pipeline.
//!
//! This crate provides the fundamental data structures used throughout tickwell:
//!
//! - [`Tick`] - A single quote update with timestamp, ask, bid, and volumes
//! - [`RawTick`] - Raw tick from the bi5 record layout before price scaling
//! - [`Instrument`] - Financial instrument with its decimal scaling factor
//! - [`Interval`] - Aggregation bucket width parsed from `<integer><unit>`
//! - [`DateRange`] - Inclusive calendar range that enumerates hourly [`Window`]s

#![doc(issue_tracker_base_url = "https://github.com/tickwell/tickwell/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod instrument;
mod interval;
mod tick;
mod window;

pub use error::ConfigError;
pub use instrument::{Category, Instrument};
pub use interval::Interval;
pub use tick::{RawTick, Tick};
pub use window::{DateRange, Window, WindowCursor, floor_to_hour, parse_date};
