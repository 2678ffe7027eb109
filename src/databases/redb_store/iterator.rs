//! Iterator types for the redb backend
//!
//! Records are read from the transaction's snapshot a page at a time, so an
//! open iterator never holds a redb range across calls.

use std::collections::VecDeque;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use log::trace;

use crate::context::Context;
use crate::databases::write_set::{BaseCursor, MergeCursor};
use crate::error::{KvError, KvResult};
use crate::traits::KvIterator;
use crate::transaction::lock;

use super::Snapshot;
use super::transaction::TxnState;

const PAGE_SIZE: usize = 256;

struct SnapshotCursor {
    snapshot: Option<Arc<Snapshot>>,
    from: Bound<Vec<u8>>,
    page: VecDeque<(Vec<u8>, Vec<u8>)>,
    drained: bool,
}

impl SnapshotCursor {
    fn fill(&mut self) -> KvResult<()> {
        let Some(snapshot) = &self.snapshot else {
            self.drained = true;
            return Ok(());
        };
        let lower = match &self.from {
            Bound::Included(key) => Bound::Included(key.as_slice()),
            Bound::Excluded(key) => Bound::Excluded(key.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };
        let range = snapshot.range::<&[u8]>((lower, Bound::Unbounded))?;
        for entry in range.take(PAGE_SIZE) {
            let (key, value) = entry?;
            self.page
                .push_back((key.value().to_vec(), value.value().to_vec()));
        }
        if let Some((last, _)) = self.page.back() {
            self.from = Bound::Excluded(last.clone());
        }
        if self.page.len() < PAGE_SIZE {
            self.drained = true;
        }
        Ok(())
    }
}

impl BaseCursor for SnapshotCursor {
    fn advance(&mut self) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        if self.page.is_empty() && !self.drained {
            self.fill()?;
        }
        Ok(self.page.pop_front())
    }

    fn release(&mut self) {
        self.snapshot = None;
        self.page.clear();
        self.drained = true;
    }
}

/// Ascending cursor over a [`super::RedbTransaction`].
pub struct RedbIterator {
    shared: Arc<Mutex<TxnState>>,
    cursor: Option<MergeCursor<SnapshotCursor>>,
    exhausted: bool,
}

impl RedbIterator {
    pub(crate) fn new(
        shared: Arc<Mutex<TxnState>>,
        snapshot: Arc<Snapshot>,
        start: &[u8],
    ) -> KvResult<Self> {
        let base = SnapshotCursor {
            snapshot: Some(snapshot),
            from: Bound::Included(start.to_vec()),
            page: VecDeque::new(),
            drained: false,
        };
        Ok(Self {
            shared,
            cursor: Some(MergeCursor::new(base, start)),
            exhausted: false,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }
}

impl KvIterator for RedbIterator {
    fn next(&mut self, ctx: &Context) -> KvResult<(Vec<u8>, Vec<u8>)> {
        if self.exhausted {
            return Err(KvError::exhausted());
        }
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(KvError::exhausted());
        };
        ctx.check()?;
        let state = lock(&self.shared);
        state.lifecycle.ensure_active()?;
        match cursor.next(&state.writes)? {
            Some(entry) => Ok(entry),
            None => {
                self.exhausted = true;
                Err(KvError::exhausted())
            }
        }
    }

    fn close(&mut self) -> KvResult<()> {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.release();
            trace!("closed redb iterator");
        }
        Ok(())
    }
}

impl Drop for RedbIterator {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
