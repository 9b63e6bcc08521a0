//! Series cache store.
//!
//! Talkers cache the raw provider records they fetch so repeated searches
//! and follow-up fetches can be answered without network calls. The store
//! keeps opaque serialized bytes; it never interprets provider data.

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// One raw series record as held by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSeries {
    /// Provider series id
    pub id: String,
    /// Serialized raw provider record (JSON bytes)
    pub data: Vec<u8>,
}

impl CachedSeries {
    pub fn new(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Read/write contract every talker consumes.
///
/// The `complete` flag marks a cached entry as authoritative: a complete
/// entry can satisfy future reads without a re-fetch, a partial one cannot.
/// Implementations serialize their own access; callers may share one store
/// across concurrent searches.
pub trait SeriesCache: Send + Sync {
    /// All cached results for a search query, in the order they were stored
    fn get_search_results(&self, source: &str, query: &str) -> Result<Vec<(CachedSeries, bool)>>;

    /// Replace the cached result set for a search query
    fn add_search_results(
        &self,
        source: &str,
        query: &str,
        series: &[CachedSeries],
        complete: bool,
    ) -> Result<()>;

    /// A single cached series record, if any
    fn get_series_info(&self, source: &str, series_id: &str) -> Result<Option<(CachedSeries, bool)>>;

    /// Store or replace a single series record
    fn add_series_info(&self, source: &str, series: &CachedSeries, complete: bool) -> Result<()>;
}

/// SQLite-backed cache store
///
/// `add_search_results` also upserts each record into the per-series table,
/// so a fetch following a search hits the cache without a second write
/// from the talker.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open or create a cache database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
        }

        debug!(path = %path.display(), "Opening series cache");

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open cache database at {}", path.display()))?;

        Self::from_connection(conn)
    }

    /// Open an in-memory cache (used by tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory cache")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS search_results (
                source TEXT NOT NULL,
                query TEXT NOT NULL,
                series_id TEXT NOT NULL,
                data BLOB NOT NULL,
                complete INTEGER NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (source, query, series_id)
            );
            CREATE TABLE IF NOT EXISTS series_info (
                source TEXT NOT NULL,
                series_id TEXT NOT NULL,
                data BLOB NOT NULL,
                complete INTEGER NOT NULL,
                PRIMARY KEY (source, series_id)
            );",
        )
        .context("Failed to create cache schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Cache connection mutex poisoned"))
    }
}

impl SeriesCache for SqliteCache {
    fn get_search_results(&self, source: &str, query: &str) -> Result<Vec<(CachedSeries, bool)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT series_id, data, complete FROM search_results
             WHERE source = ?1 AND query = ?2
             ORDER BY position",
        )?;

        let rows = stmt
            .query_map(params![source, query], |row| {
                Ok((
                    CachedSeries {
                        id: row.get(0)?,
                        data: row.get(1)?,
                    },
                    row.get::<_, bool>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read cached search results")?;

        debug!(source, query, rows = rows.len(), "Cache search lookup");
        Ok(rows)
    }

    fn add_search_results(
        &self,
        source: &str,
        query: &str,
        series: &[CachedSeries],
        complete: bool,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().context("Failed to begin cache transaction")?;

        tx.execute(
            "DELETE FROM search_results WHERE source = ?1 AND query = ?2",
            params![source, query],
        )?;

        for (position, record) in series.iter().enumerate() {
            tx.execute(
                "INSERT INTO search_results (source, query, series_id, data, complete, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![source, query, record.id, record.data, complete, position as i64],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO series_info (source, series_id, data, complete)
                 VALUES (?1, ?2, ?3, ?4)",
                params![source, record.id, record.data, complete],
            )?;
        }

        tx.commit().context("Failed to commit cached search results")?;

        debug!(source, query, rows = series.len(), complete, "Cached search results");
        Ok(())
    }

    fn get_series_info(&self, source: &str, series_id: &str) -> Result<Option<(CachedSeries, bool)>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT data, complete FROM series_info WHERE source = ?1 AND series_id = ?2",
                params![source, series_id],
                |row| {
                    Ok((
                        CachedSeries {
                            id: series_id.to_string(),
                            data: row.get(0)?,
                        },
                        row.get::<_, bool>(1)?,
                    ))
                },
            )
            .optional()
            .context("Failed to read cached series info")?;

        debug!(source, series_id, hit = row.is_some(), "Cache series lookup");
        Ok(row)
    }

    fn add_series_info(&self, source: &str, series: &CachedSeries, complete: bool) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO series_info (source, series_id, data, complete)
             VALUES (?1, ?2, ?3, ?4)",
            params![source, series.id, series.data, complete],
        )
        .context("Failed to cache series info")?;

        debug!(source, series_id = %series.id, complete, "Cached series info");
        Ok(())
    }
}
