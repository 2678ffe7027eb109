use crate::context::Context;
use crate::error::{KvError, KvResult};

/// Cursor over an ascending key range inside one transaction.
///
/// `next` past the last record returns [`KvError::NotFound`]; so does `next`
/// on a closed iterator, without touching the backend. `close` releases the
/// native cursor and may be called any number of times.
pub trait KvIterator: Send {
    fn next(&mut self, ctx: &Context) -> KvResult<(Vec<u8>, Vec<u8>)>;

    fn close(&mut self) -> KvResult<()>;
}

impl<T: KvIterator + ?Sized> KvIterator for Box<T> {
    fn next(&mut self, ctx: &Context) -> KvResult<(Vec<u8>, Vec<u8>)> {
        (**self).next(ctx)
    }

    fn close(&mut self) -> KvResult<()> {
        (**self).close()
    }
}

/// Drain `iter` into a vector, closing it whether or not draining succeeds.
pub fn collect<I: KvIterator>(mut iter: I, ctx: &Context) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let drained = drain(&mut iter, ctx, usize::MAX);
    let closed = iter.close();
    let entries = drained?;
    closed?;
    Ok(entries)
}

/// Like [`collect`] but stops after `limit` records.
pub fn collect_n<I: KvIterator>(
    mut iter: I,
    ctx: &Context,
    limit: usize,
) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let drained = drain(&mut iter, ctx, limit);
    let closed = iter.close();
    let entries = drained?;
    closed?;
    Ok(entries)
}

fn drain<I: KvIterator>(
    iter: &mut I,
    ctx: &Context,
    limit: usize,
) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut entries = Vec::new();
    while entries.len() < limit {
        match iter.next(ctx) {
            Ok(entry) => entries.push(entry),
            Err(KvError::NotFound(_)) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(entries)
}
