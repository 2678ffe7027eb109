use std::collections::VecDeque;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use log::trace;
use rusqlite::Connection;

use crate::context::Context;
use crate::databases::write_set::{BaseCursor, MergeCursor};
use crate::error::{KvError, KvResult};
use crate::traits::KvIterator;
use crate::transaction::lock;

use super::store::read_page;
use super::transaction::TxnState;

const PAGE_SIZE: usize = 256;

/// Keyset pagination over the `kv` table.
struct RowCursor {
    reader: Option<Arc<Mutex<Connection>>>,
    from: Bound<Vec<u8>>,
    page: VecDeque<(Vec<u8>, Vec<u8>)>,
    drained: bool,
}

impl RowCursor {
    fn fill(&mut self) -> KvResult<()> {
        let Some(reader) = &self.reader else {
            self.drained = true;
            return Ok(());
        };
        let from = match &self.from {
            Bound::Included(key) => Bound::Included(key.as_slice()),
            Bound::Excluded(key) => Bound::Excluded(key.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };
        let rows = read_page(&lock(reader), from, PAGE_SIZE)?;
        if rows.len() < PAGE_SIZE {
            self.drained = true;
        }
        if let Some((last, _)) = rows.last() {
            self.from = Bound::Excluded(last.clone());
        }
        self.page.extend(rows);
        Ok(())
    }
}

impl BaseCursor for RowCursor {
    fn advance(&mut self) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        if self.page.is_empty() && !self.drained {
            self.fill()?;
        }
        Ok(self.page.pop_front())
    }

    fn release(&mut self) {
        self.reader = None;
        self.page.clear();
        self.drained = true;
    }
}

/// Ascending cursor over a [`super::SqliteTransaction`].
pub struct SqliteIterator {
    shared: Arc<Mutex<TxnState>>,
    cursor: Option<MergeCursor<RowCursor>>,
    exhausted: bool,
}

impl SqliteIterator {
    pub(crate) fn new(
        shared: Arc<Mutex<TxnState>>,
        reader: Arc<Mutex<Connection>>,
        start: &[u8],
    ) -> Self {
        let base = RowCursor {
            reader: Some(reader),
            from: Bound::Included(start.to_vec()),
            page: VecDeque::new(),
            drained: false,
        };
        Self {
            shared,
            cursor: Some(MergeCursor::new(base, start)),
            exhausted: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }
}

impl KvIterator for SqliteIterator {
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
            trace!("closed sqlite iterator");
        }
        Ok(())
    }
}

impl Drop for SqliteIterator {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
