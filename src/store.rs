//! Type-erased stores.
//!
//! Adapters expose their own transaction and iterator types through the
//! associated types of [`Transactional`] and [`Ordered`]. When the backend is
//! only known at runtime (for example when it comes from a connection
//! descriptor) [`erase`] boxes all three layers behind one [`DynStore`] type.

use crate::context::Context;
use crate::error::KvResult;
use crate::traits::{Basic, KvIterator, Ordered, Transaction, Transactional};

pub type DynIterator = Box<dyn KvIterator>;
pub type DynTransaction = Box<dyn Transaction<Iter = DynIterator>>;
pub type DynStore = Box<dyn Transactional<Txn = DynTransaction>>;

/// Box a concrete store, its transactions and its iterators.
pub fn erase<S>(store: S) -> DynStore
where
    S: Transactional + 'static,
    S::Txn: 'static,
    <S::Txn as Ordered>::Iter: 'static,
{
    Box::new(Erased(store))
}

struct Erased<S>(S);

impl<S: Basic> Basic for Erased<S> {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        self.0.get(ctx, key)
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.0.put(ctx, key, value)
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        self.0.delete(ctx, key)
    }
}

impl<S> Transactional for Erased<S>
where
    S: Transactional,
    S::Txn: 'static,
    <S::Txn as Ordered>::Iter: 'static,
{
    type Txn = DynTransaction;

    fn new_transaction(&self, ctx: &Context, read_only: bool) -> KvResult<DynTransaction> {
        let txn = self.0.new_transaction(ctx, read_only)?;
        Ok(Box::new(ErasedTxn(txn)))
    }
}

struct ErasedTxn<T>(T);

impl<T: Basic> Basic for ErasedTxn<T> {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        self.0.get(ctx, key)
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.0.put(ctx, key, value)
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        self.0.delete(ctx, key)
    }
}

impl<T> Ordered for ErasedTxn<T>
where
    T: Ordered,
    T::Iter: 'static,
{
    type Iter = DynIterator;

    fn seek(&self, ctx: &Context, start: &[u8]) -> KvResult<DynIterator> {
        Ok(Box::new(self.0.seek(ctx, start)?))
    }
}

impl<T> Transaction for ErasedTxn<T>
where
    T: Transaction,
    T::Iter: 'static,
{
    fn discard(&self, ctx: &Context) -> KvResult<()> {
        self.0.discard(ctx)
    }

    fn commit(&self, ctx: &Context) -> KvResult<()> {
        self.0.commit(ctx)
    }
}
