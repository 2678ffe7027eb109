//! Buffered writes for adapters that apply a transaction in one shot.
//!
//! A [`WriteSet`] records the puts and deletes of one transaction in key order.
//! Reads consult it before the engine, and [`MergeCursor`] interleaves it with
//! an ascending engine cursor so a scan sees the transaction's own writes.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::KvResult;

/// `None` marks a buffered delete.
#[derive(Debug, Default)]
pub(crate) struct WriteSet {
    entries: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

/// What the write set knows about a key.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Buffered<'a> {
    Put(&'a [u8]),
    Deleted,
    Untouched,
}

impl WriteSet {
    pub(crate) fn put(&mut self, key: &[u8], value: &[u8]) {
        self.entries.insert(key.to_vec(), Some(value.to_vec()));
    }

    pub(crate) fn delete(&mut self, key: &[u8]) {
        self.entries.insert(key.to_vec(), None);
    }

    pub(crate) fn lookup(&self, key: &[u8]) -> Buffered<'_> {
        match self.entries.get(key) {
            Some(Some(value)) => Buffered::Put(value),
            Some(None) => Buffered::Deleted,
            None => Buffered::Untouched,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// First buffered entry strictly after `position` (or at it, when included).
    fn first_from(&self, position: Bound<&[u8]>) -> Option<(&Vec<u8>, &Option<Vec<u8>>)> {
        self.entries
            .range::<[u8], _>((position, Bound::Unbounded))
            .next()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (Vec<u8>, Option<Vec<u8>>)> {
        self.entries.into_iter()
    }
}

/// An ascending engine cursor underneath a [`MergeCursor`].
pub(crate) trait BaseCursor: Send {
    fn advance(&mut self) -> KvResult<Option<(Vec<u8>, Vec<u8>)>>;

    /// Drop the native cursor. Called exactly once.
    fn release(&mut self);
}

/// Merges an engine cursor with the live write set of its transaction.
///
/// Buffered entries shadow engine entries with the same key; buffered deletes
/// hide them. Writes made after the seek are picked up once the cursor reaches
/// them.
pub(crate) struct MergeCursor<B> {
    base: B,
    peeked: Option<(Vec<u8>, Vec<u8>)>,
    base_done: bool,
    position: Bound<Vec<u8>>,
}

impl<B: BaseCursor> MergeCursor<B> {
    /// `base` must already be positioned at the first engine key `>= start`.
    pub(crate) fn new(base: B, start: &[u8]) -> Self {
        Self {
            base,
            peeked: None,
            base_done: false,
            position: Bound::Included(start.to_vec()),
        }
    }

    pub(crate) fn next(&mut self, writes: &WriteSet) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        loop {
            if self.peeked.is_none() && !self.base_done {
                match self.base.advance()? {
                    Some(entry) => self.peeked = Some(entry),
                    None => self.base_done = true,
                }
            }

            let position = match &self.position {
                Bound::Included(key) => Bound::Included(key.as_slice()),
                Bound::Excluded(key) => Bound::Excluded(key.as_slice()),
                Bound::Unbounded => Bound::Unbounded,
            };
            let buffered = writes.first_from(position);

            match (self.peeked.take(), buffered) {
                (None, None) => return Ok(None),
                (Some(base), None) => {
                    self.position = Bound::Excluded(base.0.clone());
                    return Ok(Some(base));
                }
                (Some(base), Some((key, _))) if base.0 < *key => {
                    self.position = Bound::Excluded(base.0.clone());
                    return Ok(Some(base));
                }
                (base, Some((key, value))) => {
                    // The buffered key comes first or shadows the engine entry.
                    if let Some(base) = base {
                        if base.0 != *key {
                            self.peeked = Some(base);
                        }
                    }
                    self.position = Bound::Excluded(key.clone());
                    if let Some(value) = value {
                        return Ok(Some((key.clone(), value.clone())));
                    }
                }
            }
        }
    }

    pub(crate) fn release(&mut self) {
        self.peeked = None;
        self.base_done = true;
        self.base.release();
    }
}
