use std::sync::{Arc, Mutex};

use log::trace;

use crate::context::Context;
use crate::databases::write_set::{BaseCursor, MergeCursor};
use crate::error::{KvError, KvResult};
use crate::traits::KvIterator;
use crate::transaction::lock;

use super::transaction::TxnState;

/// Owns the native sled iterator until release.
struct LiveCursor {
    inner: Option<sled::Iter>,
}

impl BaseCursor for LiveCursor {
    fn advance(&mut self) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };
        match inner.next() {
            Some(entry) => {
                let (key, value) = entry?;
                Ok(Some((key.to_vec(), value.to_vec())))
            }
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.inner = None;
    }
}

/// Ascending cursor over a [`super::SledTransaction`].
pub struct SledIterator {
    shared: Arc<Mutex<TxnState>>,
    cursor: Option<MergeCursor<LiveCursor>>,
    exhausted: bool,
}

impl SledIterator {
    pub(crate) fn new(shared: Arc<Mutex<TxnState>>, inner: sled::Iter, start: &[u8]) -> Self {
        let base = LiveCursor { inner: Some(inner) };
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

impl KvIterator for SledIterator {
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
            trace!("closed sled iterator");
        }
        Ok(())
    }
}

impl Drop for SledIterator {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
