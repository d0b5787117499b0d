//! Feed access and record decoding for the tickwell pipeline.
//!
//! This crate covers everything between a window and its ticks:
//!
//! - [`url::FeedUrl`] - Builds per-hour blob URLs
//! - [`SourceFetcher`] / [`DownloadClient`] - One GET per window, no retries
//! - [`Decompressor`] / [`LzmaDecompressor`] - Streaming LZMA (and xz) decode
//! - [`Payload`] - Banner stripping and record alignment
//! - [`TickDecoder`] - 20-byte record to scaled [`Tick`](tickwell_types::Tick)

#![doc(issue_tracker_base_url = "https://github.com/tickwell/tickwell/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod decode;
mod decompress;
pub mod url;

pub use client::{ClientConfig, DownloadClient, FetchError, FetchResponse, SourceFetcher};
pub use decode::{
    DecodeError, Payload, TickDecoder, encode_record, parse_record, strip_banner, tick_count,
};
pub use decompress::{DecompressError, Decompressor, LzmaDecompressor, decompress_bi5};
pub use url::{FeedUrl, MonthIndexing};
