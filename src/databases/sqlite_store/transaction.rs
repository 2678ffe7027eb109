//! Transaction support for sqlite_store.

use std::sync::{Arc, Mutex};

use log::{debug, warn};
use rusqlite::{Connection, TransactionBehavior};

use crate::context::Context;
use crate::databases::write_set::{Buffered, WriteSet};
use crate::error::{KvError, KvResult};
use crate::traits::{Basic, Ordered, Transaction};
use crate::transaction::{Lifecycle, TxnStatus, lock};

use super::iterator::SqliteIterator;
use super::store::{read_value, remove_value, write_value};

pub(crate) struct TxnState {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) writes: WriteSet,
}

/// A SQLite-backed transaction.
///
/// `reader` is either a dedicated connection holding an open read transaction
/// (`pinned`) or the store's own connection.
pub struct SqliteTransaction {
    writer: Arc<Mutex<Connection>>,
    reader: Arc<Mutex<Connection>>,
    pinned: bool,
    shared: Arc<Mutex<TxnState>>,
}

impl SqliteTransaction {
    pub(crate) fn begin_pinned(
        writer: Arc<Mutex<Connection>>,
        reader: Connection,
        read_only: bool,
    ) -> KvResult<Self> {
        reader.execute_batch("BEGIN")?;
        // A deferred transaction takes its snapshot at the first read.
        reader.query_row("SELECT EXISTS (SELECT 1 FROM kv)", [], |_| Ok(()))?;
        debug!("began pinned sqlite transaction (read_only: {read_only})");
        Ok(Self::with_reader(
            writer,
            Arc::new(Mutex::new(reader)),
            true,
            read_only,
        ))
    }

    pub(crate) fn begin_shared(writer: Arc<Mutex<Connection>>, read_only: bool) -> Self {
        debug!("began sqlite transaction (read_only: {read_only})");
        let reader = Arc::clone(&writer);
        Self::with_reader(writer, reader, false, read_only)
    }

    fn with_reader(
        writer: Arc<Mutex<Connection>>,
        reader: Arc<Mutex<Connection>>,
        pinned: bool,
        read_only: bool,
    ) -> Self {
        Self {
            writer,
            reader,
            pinned,
            shared: Arc::new(Mutex::new(TxnState {
                lifecycle: Lifecycle::new(read_only),
                writes: WriteSet::default(),
            })),
        }
    }

    pub fn status(&self) -> TxnStatus {
        lock(&self.shared).lifecycle.status()
    }

    fn lookup(&self, state: &TxnState, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        match state.writes.lookup(key) {
            Buffered::Put(value) => Ok(Some(value.to_vec())),
            Buffered::Deleted => Ok(None),
            Buffered::Untouched => read_value(&lock(&self.reader), key),
        }
    }

    /// Enter a terminal state and release the pinned snapshot.
    fn end(&self, state: &mut TxnState, outcome: TxnStatus) -> bool {
        if !state.lifecycle.finish(outcome) {
            return false;
        }
        state.writes = WriteSet::default();
        if self.pinned {
            if let Err(err) = lock(&self.reader).execute_batch("ROLLBACK") {
                debug!("releasing sqlite snapshot failed: {err}");
            }
        }
        true
    }
}

fn apply(conn: &mut Connection, writes: WriteSet) -> KvResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for (key, value) in writes.into_entries() {
        match value {
            Some(value) => write_value(&tx, &key, &value)?,
            None => {
                remove_value(&tx, &key)?;
            }
        }
    }
    tx.commit()?;
    Ok(())
}

impl Basic for SqliteTransaction {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        ctx.check()?;
        let state = lock(&self.shared);
        state.lifecycle.ensure_active()?;
        self.lookup(&state, key)?.ok_or_else(KvError::missing_key)
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        ctx.check()?;
        let mut state = lock(&self.shared);
        state.lifecycle.ensure_writable()?;
        state.writes.put(key, value);
        Ok(())
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        ctx.check()?;
        let mut state = lock(&self.shared);
        state.lifecycle.ensure_writable()?;
        if self.lookup(&state, key)?.is_none() {
            return Err(KvError::missing_key());
        }
        state.writes.delete(key);
        Ok(())
    }
}

impl Ordered for SqliteTransaction {
    type Iter = SqliteIterator;

    fn seek(&self, ctx: &Context, start: &[u8]) -> KvResult<SqliteIterator> {
        ctx.check()?;
        lock(&self.shared).lifecycle.ensure_active()?;
        Ok(SqliteIterator::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.reader),
            start,
        ))
    }
}

impl Transaction for SqliteTransaction {
    fn discard(&self, _ctx: &Context) -> KvResult<()> {
        let mut state = lock(&self.shared);
        if self.end(&mut state, TxnStatus::Discarded) {
            debug!("discarded sqlite transaction");
        }
        Ok(())
    }

    fn commit(&self, ctx: &Context) -> KvResult<()> {
        let mut state = lock(&self.shared);
        if !state.lifecycle.is_active() {
            return Ok(());
        }
        if let Err(err) = ctx.check() {
            self.end(&mut state, TxnStatus::Discarded);
            return Err(err);
        }

        let writes = std::mem::take(&mut state.writes);
        let count = writes.len();
        let outcome = if writes.is_empty() {
            Ok(())
        } else {
            apply(&mut lock(&self.writer), writes)
        };

        match outcome {
            Ok(()) => {
                self.end(&mut state, TxnStatus::Committed);
                debug!("committed sqlite transaction ({count} writes)");
                Ok(())
            }
            Err(err) => {
                self.end(&mut state, TxnStatus::Discarded);
                debug!("sqlite commit failed: {err}");
                Err(err)
            }
        }
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        let mut state = lock(&self.shared);
        if self.end(&mut state, TxnStatus::Discarded) {
            warn!("sqlite transaction dropped while active; discarding its writes");
        }
    }
}
