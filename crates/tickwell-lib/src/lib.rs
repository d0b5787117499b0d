//! Resumable ingestion of Dukascopy hourly tick archives.
//!
//! Facade over the tickwell workspace crates. Each stage lives in its own
//! crate and is re-exported here behind a feature of the same name.
//!
//! # Quick Start
//!
//! ```no_run
//! use tickwell_lib::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings {
//!     asset: Some("eurusd".into()),
//!     start: Some("2024-01-01".into()),
//!     end: Some("2024-01-02".into()),
//!     interval: Some("1m".into()),
//!     csv: Some("eurusd_1m.csv".into()),
//!     ..Default::default()
//! };
//!
//! let client = DownloadClient::with_defaults()?;
//! let summary = PipelineOrchestrator::from_settings(settings, client)?
//!     .run()
//!     .await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/tickwell/tickwell/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use tickwell_types::*;

pub use tickwell_instruments::InstrumentRegistry;

#[cfg(feature = "fetch")]
pub use tickwell_fetch::{
    ClientConfig, DecodeError, DecompressError, Decompressor, DownloadClient, FeedUrl, FetchError,
    FetchResponse, LzmaDecompressor, MonthIndexing, Payload, SourceFetcher, TickDecoder,
};

#[cfg(feature = "aggregate")]
pub use tickwell_aggregate::{AggregatedBar, BarAggregator};

#[cfg(feature = "sink")]
pub use tickwell_sink::{CsvSink, PersistenceSink, SchemaKind, SinkError, SinkSet, SqliteSink};

#[cfg(feature = "pipeline")]
pub use tickwell_pipeline::{
    CancellationProbe, Clock, PipelineError, PipelineOrchestrator, ProgressObserver,
    ProgressUpdate, ResumeCoordinator, ResumePlan, ResumePolicy, RunConfig, RunSummary, Settings,
    Verbosity, WindowFault, control,
};

/// Prelude module for convenient imports.
///
/// ```
/// use tickwell_lib::prelude::*;
/// ```
pub mod prelude {
    pub use tickwell_types::{
        Category, ConfigError, DateRange, Instrument, Interval, RawTick, Tick, Window,
    };

    pub use tickwell_instruments::InstrumentRegistry;

    #[cfg(feature = "fetch")]
    pub use tickwell_fetch::{DownloadClient, FeedUrl, SourceFetcher, TickDecoder};

    #[cfg(feature = "aggregate")]
    pub use tickwell_aggregate::{AggregatedBar, BarAggregator};

    #[cfg(feature = "sink")]
    pub use tickwell_sink::{CsvSink, PersistenceSink, SinkSet, SqliteSink};

    #[cfg(feature = "pipeline")]
    pub use tickwell_pipeline::{
        PipelineOrchestrator, ResumePolicy, RunConfig, RunSummary, Settings,
    };
}
