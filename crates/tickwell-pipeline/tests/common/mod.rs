//! Shared fixtures for pipeline tests.

#![allow(dead_code, unreachable_pub)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tickwell_aggregate::AggregatedBar;
use tickwell_fetch::{FeedUrl, FetchError, FetchResponse, SourceFetcher, encode_record};
use tickwell_instruments::InstrumentRegistry;
use tickwell_pipeline::RunConfig;
use tickwell_sink::{PersistenceSink, SchemaKind, SinkError};
use tickwell_types::{DateRange, Instrument, RawTick, Tick};

pub const ASSET: &str = "EURUSD";

pub fn hour(day: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, h, 0, 0).unwrap()
}

pub fn url(hour_start: DateTime<Utc>) -> String {
    FeedUrl::default().tick_url(ASSET, hour_start)
}

pub fn eurusd() -> Instrument {
    InstrumentRegistry::global().resolve(ASSET).unwrap().clone()
}

pub fn config(start: &str, end: &str) -> RunConfig {
    RunConfig::new(eurusd(), DateRange::parse(start, end).unwrap())
}

pub fn records(ticks: &[RawTick]) -> Vec<u8> {
    ticks.iter().flat_map(encode_record).collect()
}

pub fn compress(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    lzma_rs::lzma_compress(&mut &raw[..], &mut out).unwrap();
    out
}

pub fn blob(ticks: &[RawTick]) -> Vec<u8> {
    compress(&records(ticks))
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Body(Vec<u8>),
    Transport,
}

/// Fetcher that answers from a script and records every URL it is asked for.
///
/// Unscripted URLs get `200` with an empty body.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFetcher {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, hour_start: DateTime<Utc>, reply: Reply) -> Self {
        self.replies.lock().unwrap().insert(url(hour_start), reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let reply = self.replies.lock().unwrap().get(url).cloned();
        match reply {
            None => Ok(FetchResponse::ok(Vec::new())),
            Some(Reply::Status(code)) => Ok(FetchResponse::status(code)),
            Some(Reply::Body(body)) => Ok(FetchResponse::ok(body)),
            Some(Reply::Transport) => Err(FetchError::Transport("connection reset".into())),
        }
    }
}

/// What a [`RecordingSink`] saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Initialize(SchemaKind),
    Reset,
    Truncate(DateTime<Utc>),
    Tick(Tick),
    Bar(AggregatedBar),
    Flush,
}

/// In-memory sink that logs every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
    last: Option<DateTime<Utc>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `last` as the latest persisted timestamp.
    pub fn with_last(mut self, last: DateTime<Utc>) -> Self {
        self.last = Some(last);
        self
    }

    /// Fails every append after `rows` successful ones.
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn ticks(&self) -> Vec<Tick> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Tick(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn bars(&self) -> Vec<AggregatedBar> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Bar(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    fn push_row(&mut self, event: Event) -> Result<(), SinkError> {
        let mut events = self.events.lock().unwrap();
        let rows = events
            .iter()
            .filter(|e| matches!(e, Event::Tick(_) | Event::Bar(_)))
            .count();
        if self.fail_after.is_some_and(|limit| rows >= limit) {
            return Err(SinkError::Io(std::io::Error::other("disk full")));
        }
        events.push(event);
        Ok(())
    }
}

impl PersistenceSink for RecordingSink {
    fn describe(&self) -> String {
        "recording".to_string()
    }

    fn initialize(&mut self, schema: SchemaKind) -> Result<(), SinkError> {
        self.events.lock().unwrap().push(Event::Initialize(schema));
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        self.last = None;
        self.events.lock().unwrap().push(Event::Reset);
        Ok(())
    }

    fn append_tick(&mut self, tick: &Tick) -> Result<(), SinkError> {
        self.push_row(Event::Tick(*tick))
    }

    fn append_bar(&mut self, bar: &AggregatedBar) -> Result<(), SinkError> {
        self.push_row(Event::Bar(*bar))
    }

    fn last_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, SinkError> {
        Ok(self.last)
    }

    fn truncate_from(&mut self, from: DateTime<Utc>) -> Result<usize, SinkError> {
        self.events.lock().unwrap().push(Event::Truncate(from));
        Ok(0)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.events.lock().unwrap().push(Event::Flush);
        Ok(())
    }
}
