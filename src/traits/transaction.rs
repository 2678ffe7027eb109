use crate::context::Context;
use crate::error::KvResult;
use crate::traits::store::Ordered;

/// A bounded unit of work over one store.
///
/// A transaction is `Active` until the first `commit` or `discard`; after
/// that every read, write or seek fails with [`crate::KvError::UseAfterEnd`]
/// and further `commit`/`discard` calls are no-ops. A failed `commit` still
/// ends the transaction and means none of its writes were applied.
///
/// Dropping an active transaction discards it.
pub trait Transaction: Ordered + Send {
    /// Abandon every write made through this transaction.
    fn discard(&self, ctx: &Context) -> KvResult<()>;

    /// Apply every write atomically, or none of them.
    fn commit(&self, ctx: &Context) -> KvResult<()>;
}

impl<T: Transaction + ?Sized> Transaction for Box<T> {
    fn discard(&self, ctx: &Context) -> KvResult<()> {
        (**self).discard(ctx)
    }

    fn commit(&self, ctx: &Context) -> KvResult<()> {
        (**self).commit(ctx)
    }
}
