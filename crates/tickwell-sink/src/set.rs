//! Fan-out over several sinks.

use chrono::{DateTime, Utc};
use tickwell_aggregate::AggregatedBar;
use tickwell_types::Tick;

use crate::sink::{PersistenceSink, SchemaKind, SinkError};

/// Zero or more sinks written in sequence.
///
/// There is no transaction spanning members: if a write fails halfway
/// through the set, earlier members already hold the row. An empty set
/// accepts everything and persists nothing.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn PersistenceSink>>,
}

impl SinkSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink to the set.
    pub fn push(&mut self, sink: impl PersistenceSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Adds a sink, builder style.
    #[must_use]
    pub fn with(mut self, sink: impl PersistenceSink + 'static) -> Self {
        self.push(sink);
        self
    }

    /// Returns the number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true when nothing will be persisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.describe()))
            .finish()
    }
}

impl PersistenceSink for SinkSet {
    fn describe(&self) -> String {
        if self.sinks.is_empty() {
            return "log-only".to_string();
        }
        self.sinks
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn initialize(&mut self, schema: SchemaKind) -> Result<(), SinkError> {
        self.sinks.iter_mut().try_for_each(|s| s.initialize(schema))
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        self.sinks.iter_mut().try_for_each(|s| s.reset())
    }

    fn append_tick(&mut self, tick: &Tick) -> Result<(), SinkError> {
        self.sinks.iter_mut().try_for_each(|s| s.append_tick(tick))
    }

    fn append_bar(&mut self, bar: &AggregatedBar) -> Result<(), SinkError> {
        self.sinks.iter_mut().try_for_each(|s| s.append_bar(bar))
    }

    /// Returns the earliest of the members' latest timestamps.
    ///
    /// A member without rows makes the whole set report `None`, so the run
    /// starts over from the configured range instead of leaving that member
    /// with nothing before the resume point.
    fn last_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, SinkError> {
        let mut earliest: Option<DateTime<Utc>> = None;
        for sink in &mut self.sinks {
            let Some(ts) = sink.last_timestamp()? else {
                return Ok(None);
            };
            earliest = Some(earliest.map_or(ts, |e| e.min(ts)));
        }
        Ok(earliest)
    }

    fn truncate_from(&mut self, from: DateTime<Utc>) -> Result<usize, SinkError> {
        let mut removed = 0;
        for sink in &mut self.sinks {
            removed += sink.truncate_from(from)?;
        }
        Ok(removed)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.sinks.iter_mut().try_for_each(|s| s.flush())
    }
}
