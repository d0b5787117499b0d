//! SQLite sink.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use tickwell_aggregate::AggregatedBar;
use tickwell_types::Tick;
use tracing::debug;

use crate::sink::{PersistenceSink, SchemaKind, SinkError, format_timestamp};

/// Writes rows into one table per asset and schema.
///
/// Tick rows land in `{ASSET}_tickdata` with an indexed millisecond
/// timestamp; ticks sharing a millisecond are all kept. Bar rows land in
/// `{ASSET}_bars_{interval}` keyed by interval start, so rewriting a bucket
/// replaces it. Rows between two flushes share one transaction.
#[derive(Debug)]
pub struct SqliteSink {
    location: PathBuf,
    symbol: String,
    conn: Connection,
    table: Option<(SchemaKind, String)>,
    in_transaction: bool,
}

impl SqliteSink {
    /// Opens the database named by `connection` for `symbol`.
    ///
    /// Accepts `sqlite://path`, `sqlite:path`, a plain path, or `:memory:`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(connection: &str, symbol: &str) -> Result<Self, SinkError> {
        let location = PathBuf::from(strip_scheme(connection));
        if let Some(parent) = location.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&location)?;
        Ok(Self {
            location,
            symbol: symbol.to_uppercase(),
            conn,
            table: None,
            in_transaction: false,
        })
    }

    /// Returns the database location.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Returns the table in use, once initialized.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_ref().map(|(_, name)| name.as_str())
    }

    fn create_table(&self, schema: SchemaKind, table: &str) -> Result<(), SinkError> {
        let ddl = match schema {
            SchemaKind::Ticks => format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{table}" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp_ms INTEGER NOT NULL,
                    timestamp TEXT NOT NULL,
                    ask REAL NOT NULL,
                    bid REAL NOT NULL,
                    ask_volume REAL NOT NULL,
                    bid_volume REAL NOT NULL
                );
                CREATE INDEX IF NOT EXISTS "{table}_timestamp_ms" ON "{table}"(timestamp_ms);
                "#
            ),
            SchemaKind::Bars(_) => format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{table}" (
                    interval_start_ms INTEGER PRIMARY KEY,
                    timestamp TEXT NOT NULL,
                    open_ask REAL NOT NULL,
                    high_ask REAL NOT NULL,
                    low_ask REAL NOT NULL,
                    close_ask REAL NOT NULL,
                    open_bid REAL NOT NULL,
                    high_bid REAL NOT NULL,
                    low_bid REAL NOT NULL,
                    close_bid REAL NOT NULL,
                    total_ask_volume REAL NOT NULL,
                    total_bid_volume REAL NOT NULL
                );
                "#
            ),
        };
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }

    fn table_for(&mut self, row: &'static str) -> Result<String, SinkError> {
        let (schema, table) = self
            .table
            .clone()
            .ok_or_else(|| SinkError::NotInitialized(self.describe()))?;
        if schema.row_kind() != row {
            return Err(SinkError::WrongRowKind {
                target: self.describe(),
                schema,
                row,
            });
        }
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(table)
    }
}

impl PersistenceSink for SqliteSink {
    fn describe(&self) -> String {
        match self.table_name() {
            Some(table) => format!("sqlite:{}#{table}", self.location.display()),
            None => format!("sqlite:{}", self.location.display()),
        }
    }

    fn initialize(&mut self, schema: SchemaKind) -> Result<(), SinkError> {
        let table = schema.table_name(&self.symbol);
        self.create_table(schema, &table)?;
        debug!(location = %self.location.display(), %table, "SQLite sink ready");
        self.table = Some((schema, table));
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SinkError> {
        self.flush()?;
        let (schema, table) = self
            .table
            .clone()
            .ok_or_else(|| SinkError::NotInitialized(self.describe()))?;
        self.conn
            .execute_batch(&format!(r#"DROP TABLE IF EXISTS "{table}";"#))?;
        self.create_table(schema, &table)?;
        debug!(%table, "SQLite table recreated");
        Ok(())
    }

    fn append_tick(&mut self, tick: &Tick) -> Result<(), SinkError> {
        let table = self.table_for("tick")?;
        let mut stmt = self.conn.prepare_cached(&format!(
            r#"
            INSERT INTO "{table}" (
                timestamp_ms, timestamp, ask, bid, ask_volume, bid_volume
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#
        ))?;
        stmt.execute(params![
            tick.timestamp.timestamp_millis(),
            format_timestamp(tick.timestamp),
            tick.ask,
            tick.bid,
            f64::from(tick.ask_volume),
            f64::from(tick.bid_volume),
        ])?;
        Ok(())
    }

    fn append_bar(&mut self, bar: &AggregatedBar) -> Result<(), SinkError> {
        let table = self.table_for("bar")?;
        let mut stmt = self.conn.prepare_cached(&format!(
            r#"
            INSERT INTO "{table}" (
                interval_start_ms, timestamp,
                open_ask, high_ask, low_ask, close_ask,
                open_bid, high_bid, low_bid, close_bid,
                total_ask_volume, total_bid_volume
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(interval_start_ms) DO UPDATE SET
                timestamp = excluded.timestamp,
                open_ask = excluded.open_ask,
                high_ask = excluded.high_ask,
                low_ask = excluded.low_ask,
                close_ask = excluded.close_ask,
                open_bid = excluded.open_bid,
                high_bid = excluded.high_bid,
                low_bid = excluded.low_bid,
                close_bid = excluded.close_bid,
                total_ask_volume = excluded.total_ask_volume,
                total_bid_volume = excluded.total_bid_volume
            "#
        ))?;
        stmt.execute(params![
            bar.interval_start.timestamp_millis(),
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
            bar.total_bid_volume,
        ])?;
        Ok(())
    }

    fn last_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, SinkError> {
        let Some((schema, table)) = self.table.clone() else {
            return Err(SinkError::NotInitialized(self.describe()));
        };
        let column = time_column(schema);

        let latest: Option<i64> = self
            .conn
            .query_row(
                &format!(r#"SELECT MAX({column}) FROM "{table}""#),
                [],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        Ok(latest.and_then(DateTime::from_timestamp_millis))
    }

    fn truncate_from(&mut self, from: DateTime<Utc>) -> Result<usize, SinkError> {
        let Some((schema, table)) = self.table.clone() else {
            return Err(SinkError::NotInitialized(self.describe()));
        };
        self.flush()?;
        let removed = self.conn.execute(
            &format!(r#"DELETE FROM "{table}" WHERE {} >= ?1"#, time_column(schema)),
            params![from.timestamp_millis()],
        )?;
        debug!(table = %table, from = %from, removed, "Truncated table");
        Ok(removed)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
        }
        Ok(())
    }
}

const fn time_column(schema: SchemaKind) -> &'static str {
    match schema {
        SchemaKind::Ticks => "timestamp_ms",
        SchemaKind::Bars(_) => "interval_start_ms",
    }
}

fn strip_scheme(connection: &str) -> &str {
    let connection = connection.trim();
    connection
        .strip_prefix("sqlite://")
        .or_else(|| connection.strip_prefix("sqlite:"))
        .unwrap_or(connection)
}
