//! SqliteStore implementation

use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use rusqlite::{Connection, OptionalExtension, params};

use crate::config::SqliteConfig;
use crate::context::Context;
use crate::error::{ConfigError, KvError, KvResult};
use crate::traits::{Basic, Transactional};
use crate::transaction::lock;

use super::transaction::SqliteTransaction;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv (
    key BLOB PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
) WITHOUT ROWID";

const SELECT_VALUE: &str = "SELECT value FROM kv WHERE key = ?1";
const UPSERT: &str = "INSERT INTO kv (key, value) VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value";
const DELETE: &str = "DELETE FROM kv WHERE key = ?1";
const PAGE_FROM: &str = "SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key LIMIT ?2";
const PAGE_AFTER: &str = "SELECT key, value FROM kv WHERE key > ?1 ORDER BY key LIMIT ?2";

#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    Memory,
}

/// Ordered transactional store backed by a SQLite database.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    target: Target,
    busy_timeout: Duration,
}

impl SqliteStore {
    pub fn new(config: SqliteConfig) -> KvResult<Self> {
        let target = if config.memory {
            Target::Memory
        } else {
            let path = config
                .path
                .clone()
                .ok_or_else(|| ConfigError::MissingLocation("sqlite".to_string()))?;
            Target::File(path)
        };

        let conn = match &target {
            Target::File(path) => {
                let conn = open_file(path, config.busy_timeout)?;
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn
            }
            Target::Memory => Connection::open_in_memory()?,
        };
        conn.execute(CREATE_TABLE, [])?;
        debug!("opened sqlite store ({target:?})");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            target,
            busy_timeout: config.busy_timeout,
        })
    }

    /// Create or open a database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> KvResult<Self> {
        Self::new(SqliteConfig::new(path.as_ref()))
    }

    /// A private in-memory database.
    pub fn temp() -> KvResult<Self> {
        Self::new(SqliteConfig::temp())
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File(path) => Some(path),
            Target::Memory => None,
        }
    }

    /// Checkpoint the write-ahead log into the main database file.
    pub fn flush(&self) -> KvResult<()> {
        if let Target::File(_) = self.target {
            let conn = lock(&self.conn);
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        }
        Ok(())
    }

    /// Checkpoint and release the store's connection.
    pub fn close(self) -> KvResult<()> {
        self.flush()?;
        debug!("closed sqlite store");
        Ok(())
    }
}

fn open_file(path: &Path, busy_timeout: Duration) -> KvResult<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

pub(crate) fn read_value(conn: &Connection, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
    let mut stmt = conn.prepare_cached(SELECT_VALUE)?;
    let value = stmt
        .query_row(params![key], |row| row.get::<_, Vec<u8>>(0))
        .optional()?;
    Ok(value)
}

pub(crate) fn write_value(conn: &Connection, key: &[u8], value: &[u8]) -> KvResult<()> {
    conn.prepare_cached(UPSERT)?.execute(params![key, value])?;
    Ok(())
}

/// Returns whether a row was removed.
pub(crate) fn remove_value(conn: &Connection, key: &[u8]) -> KvResult<bool> {
    let removed = conn.prepare_cached(DELETE)?.execute(params![key])?;
    Ok(removed > 0)
}

/// Up to `limit` rows in key order starting at `from`.
pub(crate) fn read_page(
    conn: &Connection,
    from: Bound<&[u8]>,
    limit: usize,
) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let (sql, key): (&str, &[u8]) = match from {
        Bound::Included(key) => (PAGE_FROM, key),
        Bound::Excluded(key) => (PAGE_AFTER, key),
        Bound::Unbounded => (PAGE_FROM, &[]),
    };
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params![key, limit as i64], |row| {
        Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(KvError::from)
}

impl Basic for SqliteStore {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        ctx.check()?;
        let conn = lock(&self.conn);
        read_value(&conn, key)?.ok_or_else(KvError::missing_key)
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        ctx.check()?;
        let conn = lock(&self.conn);
        write_value(&conn, key, value)
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        ctx.check()?;
        let conn = lock(&self.conn);
        if remove_value(&conn, key)? {
            Ok(())
        } else {
            Err(KvError::missing_key())
        }
    }
}

impl Transactional for SqliteStore {
    type Txn = SqliteTransaction;

    fn new_transaction(&self, ctx: &Context, read_only: bool) -> KvResult<SqliteTransaction> {
        ctx.check()?;
        match &self.target {
            Target::File(path) => {
                let reader = open_file(path, self.busy_timeout)?;
                SqliteTransaction::begin_pinned(Arc::clone(&self.conn), reader, read_only)
            }
            Target::Memory => Ok(SqliteTransaction::begin_shared(
                Arc::clone(&self.conn),
                read_only,
            )),
        }
    }
}
