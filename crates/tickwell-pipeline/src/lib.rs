//! Resumable hourly ingestion pipeline for tickwell.
//!
//! This crate ties the other tickwell crates together:
//!
//! - [`Settings`] / [`RunConfig`] - Layered configuration and validation
//! - [`ResumeCoordinator`] - Effective start from the sinks' last row
//! - [`PipelineOrchestrator`] - Window loop, failure policy, live tail
//! - [`RunSummary`] - Counters reported at the end of a run
//!
//! # Example
//!
//! ```no_run
//! use tickwell_fetch::DownloadClient;
//! use tickwell_pipeline::{PipelineOrchestrator, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings {
//!     asset: Some("EURUSD".into()),
//!     start: Some("2024-01-01".into()),
//!     end: Some("2024-01-07".into()),
//!     interval: Some("1m".into()),
//!     csv: Some("eurusd_1m.csv".into()),
//!     ..Default::default()
//! };
//! let client = DownloadClient::with_defaults()?;
//! let summary = PipelineOrchestrator::from_settings(settings, client)?.run().await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/tickwell/tickwell/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
pub mod control;
mod error;
mod orchestrator;
pub mod progress;
mod resume;
mod state;

pub use config::{DEFAULT_TAIL_POLL, ResumePolicy, RunConfig, Settings, Verbosity};
pub use control::{CancellationProbe, Clock};
pub use error::{PipelineError, WindowFault};
pub use orchestrator::PipelineOrchestrator;
pub use progress::{ProgressObserver, ProgressUpdate};
pub use resume::{ResumeCoordinator, ResumePlan, last_completed_hour};
pub use state::{PipelineState, RunSummary};
