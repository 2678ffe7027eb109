use std::sync::Arc;

use crate::context::Context;
use crate::error::KvResult;
use crate::traits::iterator::KvIterator;
use crate::traits::transaction::Transaction;

/// The simplest key/value contract.
///
/// `put` is an upsert on every backend. `get` and `delete` report an absent
/// key as [`crate::KvError::NotFound`].
pub trait Basic {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>>;

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()>;

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()>;
}

/// A [`Basic`] store that can also scan keys in byte-wise lexicographic order.
pub trait Ordered: Basic {
    type Iter: KvIterator;

    /// Position a new iterator on the first key `>= start`.
    ///
    /// If no such key exists the iterator starts exhausted. The caller owns
    /// the iterator and must close it (dropping it also closes it).
    fn seek(&self, ctx: &Context, start: &[u8]) -> KvResult<Self::Iter>;
}

/// A store handing out transactions.
///
/// Stores are shared between threads; every transaction belongs to a single
/// caller.
pub trait Transactional: Basic + Send + Sync {
    type Txn: Transaction;

    fn new_transaction(&self, ctx: &Context, read_only: bool) -> KvResult<Self::Txn>;

    /// Run `f` inside a read-only transaction, discarding it afterwards.
    fn view<F, R>(&self, ctx: &Context, f: F) -> KvResult<R>
    where
        Self: Sized,
        F: FnOnce(&Self::Txn) -> KvResult<R>,
    {
        let txn = self.new_transaction(ctx, true)?;
        let result = f(&txn);
        txn.discard(ctx)?;
        result
    }

    /// Run `f` inside a read-write transaction.
    ///
    /// Commits when `f` succeeds and discards when it fails. A failed commit
    /// is returned as the result of the whole unit of work.
    fn update<F, R>(&self, ctx: &Context, f: F) -> KvResult<R>
    where
        Self: Sized,
        F: FnOnce(&Self::Txn) -> KvResult<R>,
    {
        let txn = self.new_transaction(ctx, false)?;
        match f(&txn) {
            Ok(value) => {
                txn.commit(ctx)?;
                Ok(value)
            }
            Err(err) => {
                txn.discard(ctx)?;
                Err(err)
            }
        }
    }
}

impl<T: Basic + ?Sized> Basic for Box<T> {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        (**self).get(ctx, key)
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        (**self).put(ctx, key, value)
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        (**self).delete(ctx, key)
    }
}

impl<T: Ordered + ?Sized> Ordered for Box<T> {
    type Iter = T::Iter;

    fn seek(&self, ctx: &Context, start: &[u8]) -> KvResult<Self::Iter> {
        (**self).seek(ctx, start)
    }
}

impl<T: Transactional + ?Sized> Transactional for Box<T> {
    type Txn = T::Txn;

    fn new_transaction(&self, ctx: &Context, read_only: bool) -> KvResult<Self::Txn> {
        (**self).new_transaction(ctx, read_only)
    }
}

impl<T: Basic + ?Sized> Basic for Arc<T> {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        (**self).get(ctx, key)
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        (**self).put(ctx, key, value)
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        (**self).delete(ctx, key)
    }
}

impl<T: Transactional + ?Sized> Transactional for Arc<T> {
    type Txn = T::Txn;

    fn new_transaction(&self, ctx: &Context, read_only: bool) -> KvResult<Self::Txn> {
        (**self).new_transaction(ctx, read_only)
    }
}
