//! CSV file sink.

use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tickwell_aggregate::AggregatedBar;
use tickwell_types::Tick;
use tracing::debug;

use crate::sink::{PersistenceSink, SchemaKind, SinkError, format_timestamp, parse_timestamp};

/// Initial size of the tail read used to find the last row.
const TAIL_CHUNK: u64 = 4096;

/// Appends comma-delimited rows to a file.
///
/// The header is written only when the file is empty. Rows are buffered and
/// reach the file on [`flush`](PersistenceSink::flush).
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    schema: Option<SchemaKind>,
    writer: Option<BufWriter<File>>,
}

impl CsvSink {
    /// Creates a sink for `path`. Nothing is touched until `initialize`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: None,
            writer: None,
        }
    }

    /// Returns the target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&mut self, schema: SchemaKind) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&self.path)?;
        let is_empty = file.metadata()?.len() == 0;

        if !is_empty {
            let mut first = String::new();
            BufReader::new(&file).read_line(&mut first)?;
            let found = first.trim_end();
            let expected = schema.header();
            if found != expected {
                return Err(SinkError::SchemaMismatch {
                    target: self.target(),
                    found: found.to_string(),
                    expected,
                });
            }
        }

        let mut writer = BufWriter::new(file);
        if is_empty {
            writeln!(writer, "{}", schema.header())?;
        }

        self.schema = Some(schema);
        self.writer = Some(writer);
        Ok(())
    }

    fn writer_for(&mut self, row: &'static str) -> Result<&mut BufWriter<File>, SinkError> {
        let target = self.target();
        let schema = self
            .schema
            .ok_or_else(|| SinkError::NotInitialized(target.clone()))?;
        if schema.row_kind() != row {
            return Err(SinkError::WrongRowKind {
                target,
                schema,
                row,
            });
        }
        self.writer
            .as_mut()
            .ok_or(SinkError::NotInitialized(target))
    }

    /// Returns the start offset and timestamp of the last data row.
    fn last_row(&self) -> Result<Option<(u64, DateTime<Utc>)>, SinkError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let Some((offset, line)) = last_line(&self.path)? else {
            return Ok(None);
        };
        let first_field = line.split(',').next().unwrap_or_default();
        if first_field == "Timestamp" {
            return Ok(None);
        }

        parse_timestamp(first_field)
            .map(|ts| Some((offset, ts)))
            .ok_or_else(|| SinkError::Corrupt {
                target: self.target(),
                row: line,
            })
    }
}

impl PersistenceSink for CsvSink {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn initialize(&mut self, schema: SchemaKind) -> Result<(), SinkError> {
        self.open(schema)?;
        debug!(path = %self.path.display(), %schema, "CSV sink ready");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        let schema = self
            .schema
            .ok_or_else(|| SinkError::NotInitialized(self.target()))?;
        self.writer = None;
        File::create(&self.path)?;
        self.open(schema)?;
        debug!(path = %self.path.display(), "CSV sink truncated");
        Ok(())
    }

    fn append_tick(&mut self, tick: &Tick) -> Result<(), SinkError> {
        let writer = self.writer_for("tick")?;
        writeln!(
            writer,
            "{},{},{},{},{}",
            format_timestamp(tick.timestamp),
            tick.ask,
            tick.bid,
            tick.ask_volume,
            tick.bid_volume
        )?;
        Ok(())
    }

    fn append_bar(&mut self, bar: &AggregatedBar) -> Result<(), SinkError> {
        let writer = self.writer_for("bar")?;
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{}",
            format_timestamp(bar.interval_start),
            bar.open_ask,
            bar.high_ask,
            bar.low_ask,
            bar.close_ask,
            bar.open_bid,
            bar.high_bid,
            bar.low_bid,
            bar.close_bid,
            bar.total_ask_volume,
            bar.total_bid_volume
        )?;
        Ok(())
    }

    fn last_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, SinkError> {
        self.flush()?;
        Ok(self.last_row()?.map(|(_, ts)| ts))
    }

    /// Drops trailing rows one at a time; rows are in time order, so the
    /// first row older than `from` ends the scan.
    fn truncate_from(&mut self, from: DateTime<Utc>) -> Result<usize, SinkError> {
        self.flush()?;
        let mut removed = 0;
        while let Some((offset, ts)) = self.last_row()?
            && ts >= from
        {
            OpenOptions::new().write(true).open(&self.path)?.set_len(offset)?;
            removed += 1;
        }
        if removed > 0 {
            debug!(path = %self.path.display(), from = %from, removed, "Truncated CSV");
        }
        Ok(removed)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Reads the last non-empty line of a file, with the byte offset it starts
/// at, without loading all of it.
fn last_line(path: &Path) -> std::io::Result<Option<(u64, String)>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut window = TAIL_CHUNK;

    loop {
        let start = len.saturating_sub(window);
        file.seek(SeekFrom::Start(start))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let trimmed_len = buf
            .iter()
            .rposition(|&b| b != b'\n' && b != b'\r')
            .map_or(0, |i| i + 1);
        let content = &buf[..trimmed_len];

        if let Some(newline) = content.iter().rposition(|&b| b == b'\n') {
            let line = String::from_utf8_lossy(&content[newline + 1..]).into_owned();
            return Ok(Some((start + newline as u64 + 1, line)));
        }
        if start == 0 {
            return Ok((!content.is_empty())
                .then(|| (0, String::from_utf8_lossy(content).into_owned())));
        }
        window = window.saturating_mul(2);
    }
}
