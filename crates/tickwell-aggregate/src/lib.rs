//! Bar aggregation for the tickwell pipeline.
//!
//! This crate reduces a tick stream into fixed-interval bars:
//!
//! - [`AggregatedBar`] - Ask and bid OHLC with summed volumes
//! - [`BarAggregator`] - Streaming reducer, one bar per non-empty bucket

#![doc(issue_tracker_base_url = "https://github.com/tickwell/tickwell/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregator;
mod bar;

pub use aggregator::BarAggregator;
pub use bar::AggregatedBar;
