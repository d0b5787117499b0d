//! Synthetic bi5 fixtures for tickwell benchmarks.

use chrono::{DateTime, TimeZone, Utc};
use tickwell_fetch::encode_record;
use tickwell_types::RawTick;

/// Start of the hour every fixture is decoded against.
pub fn fixture_hour() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 14, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `count` records spread evenly over one hour with a slow random walk.
pub fn synthetic_records(count: u32) -> Vec<RawTick> {
    let step = RawTick::HOUR_MS / count.max(1);
    let mut ask = 109_500_u32;
    (0..count)
        .map(|i| {
            ask = match i % 7 {
                0 | 3 => ask + 2,
                5 => ask.saturating_sub(3),
                _ => ask,
            };
            RawTick::new(i * step, ask, ask - 8, 1.25, 0.75)
        })
        .collect()
}

/// Uncompressed payload of `count` records.
pub fn raw_payload(count: u32) -> Vec<u8> {
    synthetic_records(count)
        .iter()
        .flat_map(encode_record)
        .collect()
}

/// LZMA-compressed payload of `count` records, as served by the feed.
pub fn bi5_blob(count: u32) -> Vec<u8> {
    let raw = raw_payload(count);
    let mut out = Vec::with_capacity(raw.len() / 2);
    lzma_rs::lzma_compress(&mut raw.as_slice(), &mut out)
        .map(|()| out)
        .unwrap_or_default()
}
