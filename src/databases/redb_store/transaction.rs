//! Transactions over a pinned redb snapshot with buffered writes.

use std::sync::{Arc, Mutex};

use log::{debug, warn};
use redb::{Database, ReadableDatabase};

use crate::context::Context;
use crate::databases::write_set::{Buffered, WriteSet};
use crate::error::{KvError, KvResult};
use crate::traits::{Basic, Ordered, Transaction};
use crate::transaction::{Lifecycle, TxnStatus, lock};

use super::iterator::RedbIterator;
use super::{KV_TABLE, Snapshot};

pub(crate) struct TxnState {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) snapshot: Option<Arc<Snapshot>>,
    pub(crate) writes: WriteSet,
}

impl TxnState {
    fn snapshot(&self) -> KvResult<&Arc<Snapshot>> {
        self.snapshot.as_ref().ok_or(KvError::UseAfterEnd)
    }

    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        match self.writes.lookup(key) {
            Buffered::Put(_) => Ok(true),
            Buffered::Deleted => Ok(false),
            Buffered::Untouched => Ok(self.snapshot()?.get(key)?.is_some()),
        }
    }

    /// Enter a terminal state and let go of the snapshot and the write set.
    fn end(&mut self, outcome: TxnStatus) -> bool {
        if !self.lifecycle.finish(outcome) {
            return false;
        }
        self.snapshot = None;
        self.writes = WriteSet::default();
        true
    }
}

/// A redb-backed transaction.
///
/// Reads see the snapshot taken at [`crate::Transactional::new_transaction`]
/// plus this transaction's own writes.
pub struct RedbTransaction {
    db: Arc<Database>,
    shared: Arc<Mutex<TxnState>>,
}

impl RedbTransaction {
    pub(crate) fn begin(db: Arc<Database>, read_only: bool) -> KvResult<Self> {
        let read = db.begin_read()?;
        let snapshot = read.open_table(KV_TABLE)?;
        debug!("began redb transaction (read_only: {read_only})");
        Ok(Self {
            db,
            shared: Arc::new(Mutex::new(TxnState {
                lifecycle: Lifecycle::new(read_only),
                snapshot: Some(Arc::new(snapshot)),
                writes: WriteSet::default(),
            })),
        })
    }

    pub fn status(&self) -> TxnStatus {
        lock(&self.shared).lifecycle.status()
    }

    /// Number of keys written or deleted so far.
    pub fn pending_writes(&self) -> usize {
        lock(&self.shared).writes.len()
    }
}

fn apply(db: &Database, writes: WriteSet) -> KvResult<()> {
    let txn = db.begin_write()?;
    {
        let mut table = txn.open_table(KV_TABLE)?;
        for (key, value) in writes.into_entries() {
            match value {
                Some(value) => {
                    table.insert(key.as_slice(), value.as_slice())?;
                }
                None => {
                    table.remove(key.as_slice())?;
                }
            }
        }
    }
    txn.commit()?;
    Ok(())
}

impl Basic for RedbTransaction {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        ctx.check()?;
        let state = lock(&self.shared);
        state.lifecycle.ensure_active()?;
        match state.writes.lookup(key) {
            Buffered::Put(value) => Ok(value.to_vec()),
            Buffered::Deleted => Err(KvError::missing_key()),
            Buffered::Untouched => {
                let value = state.snapshot()?.get(key)?.map(|guard| guard.value().to_vec());
                value.ok_or_else(KvError::missing_key)
            }
        }
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
        if !state.contains(key)? {
            return Err(KvError::missing_key());
        }
        state.writes.delete(key);
        Ok(())
    }
}

impl Ordered for RedbTransaction {
    type Iter = RedbIterator;

    fn seek(&self, ctx: &Context, start: &[u8]) -> KvResult<RedbIterator> {
        ctx.check()?;
        let state = lock(&self.shared);
        state.lifecycle.ensure_active()?;
        let snapshot = Arc::clone(state.snapshot()?);
        drop(state);
        RedbIterator::new(Arc::clone(&self.shared), snapshot, start)
    }
}

impl Transaction for RedbTransaction {
    fn discard(&self, _ctx: &Context) -> KvResult<()> {
        if lock(&self.shared).end(TxnStatus::Discarded) {
            debug!("discarded redb transaction");
        }
        Ok(())
    }

    fn commit(&self, ctx: &Context) -> KvResult<()> {
        let mut state = lock(&self.shared);
        if !state.lifecycle.is_active() {
            return Ok(());
        }
        if let Err(err) = ctx.check() {
            state.end(TxnStatus::Discarded);
            return Err(err);
        }

        let writes = std::mem::take(&mut state.writes);
        let count = writes.len();
        let outcome = if writes.is_empty() {
            Ok(())
        } else {
            apply(&self.db, writes)
        };

        match outcome {
            Ok(()) => {
                state.end(TxnStatus::Committed);
                debug!("committed redb transaction ({count} writes)");
                Ok(())
            }
            Err(err) => {
                state.end(TxnStatus::Discarded);
                debug!("redb commit failed: {err}");
                Err(err)
            }
        }
    }
}

impl Drop for RedbTransaction {
    fn drop(&mut self) {
        if lock(&self.shared).end(TxnStatus::Discarded) {
            warn!("redb transaction dropped while active; discarding its writes");
        }
    }
}
