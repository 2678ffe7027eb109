//! `&str` keys over a byte-keyed store.
//!
//! Keys are stored as their UTF-8 bytes, so string order and byte order
//! coincide. Iteration decodes keys back into `String`s and reports keys that
//! were written as non-UTF-8 bytes by another client as
//! [`DecodeError::InvalidUtf8`].

use crate::context::Context;
use crate::error::{DecodeError, KvResult};
use crate::traits::{Basic, KvIterator, Transaction, Transactional};

#[derive(Debug, Clone)]
pub struct StringKeyed<S> {
    inner: S,
}

impl<S> StringKeyed<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Basic> StringKeyed<S> {
    pub fn get(&self, ctx: &Context, key: &str) -> KvResult<Vec<u8>> {
        self.inner.get(ctx, key.as_bytes())
    }

    pub fn put(&self, ctx: &Context, key: &str, value: &[u8]) -> KvResult<()> {
        self.inner.put(ctx, key.as_bytes(), value)
    }

    pub fn delete(&self, ctx: &Context, key: &str) -> KvResult<()> {
        self.inner.delete(ctx, key.as_bytes())
    }
}

impl<S: Transactional> StringKeyed<S> {
    pub fn new_transaction(
        &self,
        ctx: &Context,
        read_only: bool,
    ) -> KvResult<StringKeyedTransaction<S::Txn>> {
        Ok(StringKeyedTransaction {
            inner: self.inner.new_transaction(ctx, read_only)?,
        })
    }
}

pub struct StringKeyedTransaction<T> {
    inner: T,
}

impl<T: Transaction> StringKeyedTransaction<T> {
    pub fn get(&self, ctx: &Context, key: &str) -> KvResult<Vec<u8>> {
        self.inner.get(ctx, key.as_bytes())
    }

    pub fn put(&self, ctx: &Context, key: &str, value: &[u8]) -> KvResult<()> {
        self.inner.put(ctx, key.as_bytes(), value)
    }

    pub fn delete(&self, ctx: &Context, key: &str) -> KvResult<()> {
        self.inner.delete(ctx, key.as_bytes())
    }

    pub fn seek(&self, ctx: &Context, start: &str) -> KvResult<StringKeyedIterator<T::Iter>> {
        Ok(StringKeyedIterator {
            inner: self.inner.seek(ctx, start.as_bytes())?,
        })
    }

    pub fn commit(&self, ctx: &Context) -> KvResult<()> {
        self.inner.commit(ctx)
    }

    pub fn discard(&self, ctx: &Context) -> KvResult<()> {
        self.inner.discard(ctx)
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

pub struct StringKeyedIterator<I> {
    inner: I,
}

impl<I: KvIterator> StringKeyedIterator<I> {
    pub fn next(&mut self, ctx: &Context) -> KvResult<(String, Vec<u8>)> {
        let (key, value) = self.inner.next(ctx)?;
        let key = String::from_utf8(key).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok((key, value))
    }

    pub fn close(&mut self) -> KvResult<()> {
        self.inner.close()
    }
}
