//! SQL-backed durable sink writing to the `bot_log` table.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::LogSink;
use crate::config::Config;
use crate::entry::{Direction, LogEntry};
use crate::error::LogError;

const MEMORY_URL: &str = ":memory:";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct StoreSink {
    pool: Pool<SqliteConnectionManager>,
}

impl StoreSink {
    /// Connect to the store at `url` (a file path, `sqlite://<path>` or `:memory:`).
    pub fn open(url: &str, pool_size: u32) -> Result<Self, LogError> {
        let path = url.strip_prefix("sqlite://").unwrap_or(url).trim();
        if path.is_empty() {
            return Err(LogError::configuration("empty log store url"));
        }

        // Each in-memory connection is its own database
        let (manager, pool_size) = if path == MEMORY_URL {
            (SqliteConnectionManager::memory(), 1)
        } else {
            // Concurrent writers wait for the file lock instead of failing
            let manager = SqliteConnectionManager::file(path).with_init(|conn| {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.execute_batch("PRAGMA journal_mode=WAL;")
            });
            (manager, pool_size.max(1))
        };

        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| LogError::configuration(format!("cannot open log store {}: {}", path, e)))?;

        log::info!("[BOT_LOG] Log store opened at {} (pool size {})", path, pool_size);

        Ok(Self { pool })
    }

    /// Open the store named by `BOT_LOG_URL` and make sure its table exists.
    pub fn from_config(config: &Config) -> Result<Self, LogError> {
        let url = config
            .bot_log_url
            .as_deref()
            .ok_or_else(|| LogError::configuration("BOT_LOG_URL is not set"))?;
        let sink = Self::open(url, config.pool_size)?;
        sink.ensure_schema()?;
        Ok(sink)
    }

    pub fn ensure_schema(&self) -> Result<(), LogError> {
        let conn = self.pool.get()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS bot_log (
                date_time TEXT NOT NULL,
                appName TEXT NOT NULL,
                type TEXT NOT NULL,
                data TEXT NOT NULL,
                className TEXT NOT NULL,
                host TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_bot_log_date_time ON bot_log(date_time);",
        )?;
        Ok(())
    }

    /// Newest rows first
    pub fn recent_entries(&self, limit: usize) -> Result<Vec<LogEntry>, LogError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT date_time, appName, type, data, className, host
             FROM bot_log ORDER BY date_time DESC, rowid DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(rusqlite::params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (date_time, app_name, direction, data, class_name, host) = row?;
            let date_time = DateTime::parse_from_rfc3339(&date_time)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| LogError::Persistence(format!("bad date_time {}: {}", date_time, e)))?;
            let direction = match direction.as_str() {
                "OUT" => Direction::Out,
                "IN" => Direction::In,
                other => return Err(LogError::Persistence(format!("bad type {}", other))),
            };
            entries.push(LogEntry {
                date_time,
                app_name,
                direction,
                data,
                class_name,
                host,
            });
        }
        Ok(entries)
    }
}

impl LogSink for StoreSink {
    fn name(&self) -> &str {
        "store"
    }

    fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO bot_log (date_time, appName, type, data, className, host)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.date_time.to_rfc3339(),
                entry.app_name,
                entry.direction.as_str(),
                entry.data,
                entry.class_name,
                entry.host,
            ],
        )?;
        Ok(())
    }
}

/// Store sink that connects on first write.
///
/// A failed connection is remembered: every later write reports the same
/// configuration error without trying again.
pub struct LazyStoreSink {
    config: Config,
    inner: OnceCell<Result<StoreSink, LogError>>,
    connect_attempts: AtomicUsize,
}

impl LazyStoreSink {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
            connect_attempts: AtomicUsize::new(0),
        }
    }

    /// How many times the store was opened. Never more than one.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// The connected store, once a write has opened it
    pub fn store(&self) -> Option<&StoreSink> {
        self.inner.get().and_then(|result| result.as_ref().ok())
    }

    fn sink(&self) -> Result<&StoreSink, LogError> {
        let result = self.inner.get_or_init(|| {
            self.connect_attempts.fetch_add(1, Ordering::SeqCst);
            let opened = StoreSink::from_config(&self.config);
            if let Err(e) = &opened {
                log::error!("[BOT_LOG] Log store unavailable, entries will be dropped: {}", e);
            }
            opened
        });
        match result {
            Ok(sink) => Ok(sink),
            Err(e) => Err(match e {
                LogError::Configuration(_) => e.clone(),
                other => LogError::configuration(other.to_string()),
            }),
        }
    }
}

impl LogSink for LazyStoreSink {
    fn name(&self) -> &str {
        "store"
    }

    fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        self.sink()?.write(entry)
    }
}
