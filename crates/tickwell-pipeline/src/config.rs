//! Run configuration.
//!
//! Settings arrive from a TOML file and from command-line flags as
//! [`Settings`], where every field is optional. Layers are merged with
//! [`Settings::merge`] and then validated into a [`RunConfig`], which is the
//! only form the orchestrator accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tickwell_fetch::url::BASE_URL;
use tickwell_fetch::{FeedUrl, MonthIndexing};
use tickwell_instruments::InstrumentRegistry;
use tickwell_sink::{CsvSink, SchemaKind, SinkError, SinkSet, SqliteSink};
use tickwell_types::{ConfigError, DateRange, Instrument, Interval};

/// Default pause between live-tail cycles.
pub const DEFAULT_TAIL_POLL: Duration = Duration::from_secs(60);

/// What to do with data already present in the sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResumePolicy {
    /// Discard existing rows and start at the configured start date.
    #[default]
    Restart,
    /// Continue after the last persisted row, stop at the configured end.
    ContinueToEnd,
    /// Continue after the last persisted row up to now, then keep polling.
    ContinueToNowAndTail,
}

impl ResumePolicy {
    /// Returns the policy as it is spelled in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::ContinueToEnd => "continue-to-end",
            Self::ContinueToNowAndTail => "continue-to-now-and-tail",
        }
    }

    /// Returns true for the policies that read the sinks' last timestamp.
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        !matches!(self, Self::Restart)
    }
}

impl std::fmt::Display for ResumePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResumePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "restart" => Ok(Self::Restart),
            "continue-to-end" | "continue" => Ok(Self::ContinueToEnd),
            "continue-to-now-and-tail" | "tail" => Ok(Self::ContinueToNowAndTail),
            _ => Err(ConfigError::InvalidValue {
                option: "resume",
                value: s.to_string(),
                reason: "expected restart, continue-to-end or continue-to-now-and-tail".into(),
            }),
        }
    }
}

/// How much the run reports while it works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Errors only.
    Silent,
    /// Progress bar and warnings.
    #[default]
    Progress,
    /// Per-window diagnostics.
    Verbose,
}

impl Verbosity {
    /// Returns the default log filter directive for this verbosity.
    #[must_use]
    pub const fn default_filter(&self) -> &'static str {
        match self {
            Self::Silent => "error",
            Self::Progress => "warn",
            Self::Verbose => "debug",
        }
    }

    /// Returns true if a progress bar should be drawn.
    #[must_use]
    pub const fn shows_progress(&self) -> bool {
        matches!(self, Self::Progress)
    }
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silent" | "quiet" => Ok(Self::Silent),
            "progress" => Ok(Self::Progress),
            "verbose" => Ok(Self::Verbose),
            _ => Err(ConfigError::InvalidValue {
                option: "verbosity",
                value: s.to_string(),
                reason: "expected silent, progress or verbose".into(),
            }),
        }
    }
}

/// Unvalidated configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Asset identifier, e.g. `EURUSD`.
    pub asset: Option<String>,
    /// First calendar day, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// Last calendar day, `YYYY-MM-DD`, inclusive.
    pub end: Option<String>,
    /// Aggregation interval, e.g. `5m`. Absent means raw ticks.
    pub interval: Option<String>,
    /// CSV output path.
    pub csv: Option<PathBuf>,
    /// SQLite connection string.
    pub store: Option<String>,
    /// Resume policy.
    pub resume: Option<ResumePolicy>,
    /// Reporting level.
    pub verbosity: Option<Verbosity>,
    /// Seconds between live-tail cycles.
    pub tail_poll_secs: Option<u64>,
    /// Feed base URL.
    pub feed_url: Option<String>,
    /// Month numbering in feed URLs.
    pub month_indexing: Option<MonthIndexing>,
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or has unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::File {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        toml::from_str(&text).map_err(|e| file_error(e.to_string()))
    }

    /// Overlays `overrides` on top of `self`; set fields in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            asset: overrides.asset.or(self.asset),
            start: overrides.start.or(self.start),
            end: overrides.end.or(self.end),
            interval: overrides.interval.or(self.interval),
            csv: overrides.csv.or(self.csv),
            store: overrides.store.or(self.store),
            resume: overrides.resume.or(self.resume),
            verbosity: overrides.verbosity.or(self.verbosity),
            tail_poll_secs: overrides.tail_poll_secs.or(self.tail_poll_secs),
            feed_url: overrides.feed_url.or(self.feed_url),
            month_indexing: overrides.month_indexing.or(self.month_indexing),
        }
    }

    /// Validates the settings into a run configuration.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a missing or malformed option, an
    /// unknown asset, an inverted date range, or an unusable sink target.
    pub fn validate(self) -> Result<RunConfig, ConfigError> {
        let asset = self.asset.ok_or(ConfigError::Missing("asset"))?;
        let instrument = InstrumentRegistry::global().resolve(&asset)?.clone();

        let start = self.start.ok_or(ConfigError::Missing("start"))?;
        let end = self.end.ok_or(ConfigError::Missing("end"))?;
        let range = DateRange::parse(&start, &end)?;

        let interval = self.interval.as_deref().map(str::parse::<Interval>).transpose()?;

        if let Some(csv) = &self.csv
            && csv.as_os_str().is_empty()
        {
            return Err(ConfigError::InvalidSink {
                target: String::new(),
                reason: "CSV path is empty".into(),
            });
        }
        let store = self.store.map(|s| s.trim().to_string());
        if let Some(store) = &store
            && matches!(store.as_str(), "" | "sqlite://" | "sqlite:")
        {
            return Err(ConfigError::InvalidSink {
                target: store.clone(),
                reason: "store connection string names no database".into(),
            });
        }

        let base = self.feed_url.unwrap_or_else(|| BASE_URL.to_string());
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidFeedUrl(base));
        }

        Ok(RunConfig {
            instrument,
            range,
            interval,
            csv: self.csv,
            store,
            resume: self.resume.unwrap_or_default(),
            verbosity: self.verbosity.unwrap_or_default(),
            tail_poll: self
                .tail_poll_secs
                .map_or(DEFAULT_TAIL_POLL, Duration::from_secs),
            feed: FeedUrl::new(base, self.month_indexing.unwrap_or_default()),
        })
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Asset being ingested, with its scaling factor.
    pub instrument: Instrument,
    /// Inclusive calendar range.
    pub range: DateRange,
    /// Aggregation interval; `None` passes raw ticks through.
    pub interval: Option<Interval>,
    /// CSV output path.
    pub csv: Option<PathBuf>,
    /// SQLite connection string.
    pub store: Option<String>,
    /// Resume policy.
    pub resume: ResumePolicy,
    /// Reporting level.
    pub verbosity: Verbosity,
    /// Pause between live-tail cycles.
    pub tail_poll: Duration,
    /// Feed URL builder.
    pub feed: FeedUrl,
}

impl RunConfig {
    /// Creates a configuration with defaults for everything but the essentials.
    #[must_use]
    pub fn new(instrument: Instrument, range: DateRange) -> Self {
        Self {
            instrument,
            range,
            interval: None,
            csv: None,
            store: None,
            resume: ResumePolicy::default(),
            verbosity: Verbosity::default(),
            tail_poll: DEFAULT_TAIL_POLL,
            feed: FeedUrl::default(),
        }
    }

    /// Returns the instrument's first day with data when the range opens
    /// before it. Hours before that day answer with `404 Not Found`.
    #[must_use]
    pub fn data_starts_after_range(&self) -> Option<DateTime<Utc>> {
        let first = self.instrument.start_tick_date()?;
        (!self.instrument.has_data_for(self.range.first_hour())).then_some(first)
    }

    /// Returns the row shape sinks will receive.
    #[must_use]
    pub fn schema(&self) -> SchemaKind {
        self.interval.map_or(SchemaKind::Ticks, SchemaKind::Bars)
    }

    /// Opens the configured sinks. Neither target configured means log-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn open_sinks(&self) -> Result<SinkSet, SinkError> {
        let mut sinks = SinkSet::new();
        if let Some(path) = &self.csv {
            sinks.push(CsvSink::new(path));
        }
        if let Some(store) = &self.store {
            sinks.push(SqliteSink::open(store, self.instrument.id())?);
        }
        Ok(sinks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Settings {
        Settings {
            asset: Some("EURUSD".into()),
            start: Some("2024-01-01".into()),
            end: Some("2024-01-02".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_defaults() {
        let config = minimal().validate().unwrap();
        assert_eq!(config.instrument.id(), "eurusd");
        assert_eq!(config.range.total_hours(), 48);
        assert_eq!(config.interval, None);
        assert_eq!(config.schema(), SchemaKind::Ticks);
        assert_eq!(config.resume, ResumePolicy::Restart);
        assert_eq!(config.verbosity, Verbosity::Progress);
        assert_eq!(config.tail_poll, DEFAULT_TAIL_POLL);
        assert_eq!(config.feed, FeedUrl::default());
        assert!(config.open_sinks().unwrap().is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let settings = Settings::from_toml_str(
            r#"
            asset = "xauusd"
            start = "2023-06-01"
            end = "2023-06-30"
            interval = "15m"
            store = "sqlite://ticks.db"
            resume = "continue-to-now-and-tail"
            verbosity = "verbose"
            tail_poll_secs = 5
            feed_url = "http://localhost:8080/datafeed"
            month_indexing = "one"
            "#,
        )
        .unwrap();

        let config = settings.validate().unwrap();
        assert_eq!(config.instrument.decimal_factor(), 1_000);
        assert_eq!(config.interval.unwrap().to_string(), "15m");
        assert_eq!(config.resume, ResumePolicy::ContinueToNowAndTail);
        assert_eq!(config.verbosity, Verbosity::Verbose);
        assert_eq!(config.tail_poll, Duration::from_secs(5));
        assert_eq!(config.feed.month_indexing(), MonthIndexing::One);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Settings::from_toml_str("asset = \"eurusd\"\nthreads = 4\n");
        assert!(matches!(result, Err(ConfigError::File { .. })));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = Settings {
            interval: Some("1h".into()),
            verbosity: Some(Verbosity::Silent),
            ..minimal()
        };
        let cli = Settings {
            interval: Some("5m".into()),
            ..Default::default()
        };

        let merged = file.merge(cli);
        assert_eq!(merged.interval.as_deref(), Some("5m"));
        assert_eq!(merged.verbosity, Some(Verbosity::Silent));
        assert_eq!(merged.asset.as_deref(), Some("EURUSD"));
    }

    #[test]
    fn test_validation_errors() {
        let missing = Settings {
            asset: None,
            ..minimal()
        };
        assert_eq!(missing.validate().unwrap_err(), ConfigError::Missing("asset"));

        let unknown = Settings {
            asset: Some("ZZZZZZ".into()),
            ..minimal()
        };
        assert!(matches!(
            unknown.validate(),
            Err(ConfigError::UnknownInstrument(_))
        ));

        let inverted = Settings {
            start: Some("2024-02-01".into()),
            ..minimal()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvalidRange { .. })
        ));

        let bad_interval = Settings {
            interval: Some("5w".into()),
            ..minimal()
        };
        assert!(matches!(
            bad_interval.validate(),
            Err(ConfigError::InvalidInterval { .. })
        ));

        let bad_feed = Settings {
            feed_url: Some("ftp://mirror".into()),
            ..minimal()
        };
        assert!(matches!(
            bad_feed.validate(),
            Err(ConfigError::InvalidFeedUrl(_))
        ));

        let bad_store = Settings {
            store: Some("sqlite://".into()),
            ..minimal()
        };
        assert!(matches!(
            bad_store.validate(),
            Err(ConfigError::InvalidSink { .. })
        ));
    }

    #[test]
    fn test_range_before_first_data() {
        let early = Settings {
            start: Some("2003-05-01".into()),
            end: Some("2003-05-10".into()),
            ..minimal()
        }
        .validate()
        .unwrap();
        let first = early.data_starts_after_range().unwrap();
        assert_eq!(first.format("%Y-%m-%d").to_string(), "2003-05-05");

        assert_eq!(minimal().validate().unwrap().data_starts_after_range(), None);
    }

    #[test]
    fn test_policy_and_verbosity_parse() {
        assert_eq!("tail".parse::<ResumePolicy>().unwrap(), ResumePolicy::ContinueToNowAndTail);
        assert_eq!(
            "continue-to-end".parse::<ResumePolicy>().unwrap(),
            ResumePolicy::ContinueToEnd
        );
        assert!("sometimes".parse::<ResumePolicy>().is_err());
        assert_eq!("silent".parse::<Verbosity>().unwrap().default_filter(), "error");
        assert_eq!(Verbosity::Verbose.default_filter(), "debug");
    }
}
