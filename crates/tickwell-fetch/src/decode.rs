//! Binary tick decoding from the bi5 record format.

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tickwell_types::{Instrument, RawTick, Tick};

/// Prefix of the textual header line some mirrors prepend to a blob.
const HEADER_PREFIX: &[u8] = b"Timestamp";

/// Number of leading bytes inspected when guessing whether a line is text.
const BANNER_PROBE_LEN: usize = 10;

/// A single record that could not be turned into a tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The slice handed to the decoder is not exactly one record.
    #[error("record is {0} bytes, expected {size}", size = RawTick::SIZE)]
    WrongLength(usize),

    /// The millisecond offset does not fall inside the hour.
    #[error("tick offset {0} ms lies outside the hour")]
    OffsetOutOfRange(u32),
}

/// Decompressed blob split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload<'a> {
    /// Whole 20-byte records, in order.
    pub records: &'a [u8],
    /// Number of text lines removed from the front.
    pub banner_lines: usize,
    /// Bytes dropped from the end because they do not form a full record.
    pub trailing_bytes: usize,
}

impl<'a> Payload<'a> {
    /// Strips any text banner and truncates to a whole number of records.
    #[must_use]
    pub fn split(data: &'a [u8]) -> Self {
        let (body, banner_lines) = strip_banner(data);
        let whole = body.len() - body.len() % RawTick::SIZE;
        Self {
            records: &body[..whole],
            banner_lines,
            trailing_bytes: body.len() - whole,
        }
    }

    /// Returns the number of complete records.
    #[must_use]
    pub const fn record_count(&self) -> usize {
        tick_count(self.records.len())
    }

    /// Returns true if trailing bytes were dropped.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.trailing_bytes > 0
    }
}

/// Removes newline-terminated text lines from the front of a blob.
///
/// A line beginning with `Timestamp` is always removed. Any other line is
/// removed when its first (up to) ten bytes are printable ASCII. Stops at
/// the first line that qualifies for neither rule, or when no newline
/// remains. Returns the remaining bytes and the number of lines removed.
#[must_use]
pub fn strip_banner(mut data: &[u8]) -> (&[u8], usize) {
    let mut lines = 0;

    while !data.is_empty() {
        let probe = &data[..data.len().min(BANNER_PROBE_LEN)];
        let is_text = data.starts_with(HEADER_PREFIX)
            || probe.iter().all(|b| (0x20..=0x7E).contains(b));
        if !is_text {
            break;
        }

        match data.iter().position(|&b| b == b'\n') {
            Some(newline) => {
                data = &data[newline + 1..];
                lines += 1;
            }
            None => break,
        }
    }

    (data, lines)
}

/// Parses one 20-byte record without scaling.
///
/// # Errors
///
/// Returns [`DecodeError::WrongLength`] if `record` is not 20 bytes.
pub fn parse_record(record: &[u8]) -> Result<RawTick, DecodeError> {
    if record.len() != RawTick::SIZE {
        return Err(DecodeError::WrongLength(record.len()));
    }

    Ok(RawTick::new(
        BigEndian::read_u32(&record[0..4]),
        BigEndian::read_u32(&record[4..8]),
        BigEndian::read_u32(&record[8..12]),
        BigEndian::read_f32(&record[12..16]),
        BigEndian::read_f32(&record[16..20]),
    ))
}

/// Writes a raw tick into the 20-byte big-endian layout.
#[must_use]
pub fn encode_record(raw: &RawTick) -> [u8; RawTick::SIZE] {
    let mut bytes = [0u8; RawTick::SIZE];
    BigEndian::write_u32(&mut bytes[0..4], raw.ms_offset);
    BigEndian::write_u32(&mut bytes[4..8], raw.ask_raw);
    BigEndian::write_u32(&mut bytes[8..12], raw.bid_raw);
    BigEndian::write_f32(&mut bytes[12..16], raw.ask_volume);
    BigEndian::write_f32(&mut bytes[16..20], raw.bid_volume);
    bytes
}

/// Returns the number of whole records in `data_len` bytes.
#[must_use]
pub const fn tick_count(data_len: usize) -> usize {
    data_len / RawTick::SIZE
}

/// Turns bi5 records into scaled ticks for one instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickDecoder {
    decimal_factor: f64,
}

impl TickDecoder {
    /// Creates a decoder with the given price divisor.
    #[must_use]
    pub fn new(decimal_factor: u32) -> Self {
        Self {
            decimal_factor: f64::from(decimal_factor),
        }
    }

    /// Creates a decoder using the instrument's scaling factor.
    #[must_use]
    pub fn for_instrument(instrument: &Instrument) -> Self {
        Self::new(instrument.decimal_factor())
    }

    /// Returns the price divisor.
    #[must_use]
    pub const fn decimal_factor(&self) -> f64 {
        self.decimal_factor
    }

    /// Decodes one record belonging to the hour starting at `hour_start`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has the wrong size or its offset is
    /// not below one hour.
    pub fn decode(&self, record: &[u8], hour_start: DateTime<Utc>) -> Result<Tick, DecodeError> {
        let raw = parse_record(record)?;
        if !raw.is_within_hour() {
            return Err(DecodeError::OffsetOutOfRange(raw.ms_offset));
        }
        Ok(raw.normalize(hour_start, self.decimal_factor))
    }

    /// Decodes every record of a payload in order.
    ///
    /// Each item is a tick or the error for that single record, so callers
    /// can skip bad records and keep going.
    pub fn decode_all<'a>(
        &'a self,
        payload: &Payload<'a>,
        hour_start: DateTime<Utc>,
    ) -> impl Iterator<Item = Result<Tick, DecodeError>> + 'a {
        payload
            .records
            .chunks_exact(RawTick::SIZE)
            .map(move |record| self.decode(record, hour_start))
    }
}
