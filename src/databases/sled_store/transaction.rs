//! Transaction support for sled_store.
//!
//! Writes are buffered in a [`WriteSet`] and applied as one [`sled::Batch`] on
//! commit, which sled guarantees to be atomic.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::context::Context;
use crate::databases::write_set::{Buffered, WriteSet};
use crate::error::{KvError, KvResult};
use crate::traits::{Basic, Ordered, Transaction};
use crate::transaction::{Lifecycle, TxnStatus, lock};

use super::iterator::SledIterator;

pub(crate) struct TxnState {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) writes: WriteSet,
}

impl TxnState {
    fn end(&mut self, outcome: TxnStatus) -> bool {
        if !self.lifecycle.finish(outcome) {
            return false;
        }
        self.writes = WriteSet::default();
        true
    }
}

/// A sled-backed transaction with read-committed reads.
pub struct SledTransaction {
    db: sled::Db,
    shared: Arc<Mutex<TxnState>>,
}

impl SledTransaction {
    pub(crate) fn begin(db: sled::Db, read_only: bool) -> Self {
        debug!("began sled transaction (read_only: {read_only})");
        Self {
            db,
            shared: Arc::new(Mutex::new(TxnState {
                lifecycle: Lifecycle::new(read_only),
                writes: WriteSet::default(),
            })),
        }
    }

    pub fn status(&self) -> TxnStatus {
        lock(&self.shared).lifecycle.status()
    }

    fn contains(&self, state: &TxnState, key: &[u8]) -> KvResult<bool> {
        match state.writes.lookup(key) {
            Buffered::Put(_) => Ok(true),
            Buffered::Deleted => Ok(false),
            Buffered::Untouched => Ok(self.db.contains_key(key)?),
        }
    }
}

impl Basic for SledTransaction {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        ctx.check()?;
        let state = lock(&self.shared);
        state.lifecycle.ensure_active()?;
        match state.writes.lookup(key) {
            Buffered::Put(value) => Ok(value.to_vec()),
            Buffered::Deleted => Err(KvError::missing_key()),
            Buffered::Untouched => match self.db.get(key)? {
                Some(value) => Ok(value.to_vec()),
                None => Err(KvError::missing_key()),
            },
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
        if !self.contains(&state, key)? {
            return Err(KvError::missing_key());
        }
        state.writes.delete(key);
        Ok(())
    }
}

impl Ordered for SledTransaction {
    type Iter = SledIterator;

    fn seek(&self, ctx: &Context, start: &[u8]) -> KvResult<SledIterator> {
        ctx.check()?;
        lock(&self.shared).lifecycle.ensure_active()?;
        Ok(SledIterator::new(
            Arc::clone(&self.shared),
            self.db.range(start..),
            start,
        ))
    }
}

impl Transaction for SledTransaction {
    fn discard(&self, _ctx: &Context) -> KvResult<()> {
        if lock(&self.shared).end(TxnStatus::Discarded) {
            debug!("discarded sled transaction");
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
        let mut batch = sled::Batch::default();
        for (key, value) in writes.into_entries() {
            match value {
                Some(value) => batch.insert(key, value),
                None => batch.remove(key),
            }
        }

        match self.db.apply_batch(batch) {
            Ok(()) => {
                state.end(TxnStatus::Committed);
                debug!("committed sled transaction ({count} writes)");
                Ok(())
            }
            Err(err) => {
                state.end(TxnStatus::Discarded);
                debug!("sled commit failed: {err}");
                Err(err.into())
            }
        }
    }
}

impl Drop for SledTransaction {
    fn drop(&mut self) {
        if lock(&self.shared).end(TxnStatus::Discarded) {
            warn!("sled transaction dropped while active; discarding its writes");
        }
    }
}
