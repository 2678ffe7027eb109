use log::debug;

use crate::context::Context;
use crate::error::{DecodeError, KvError, KvResult};
use crate::registry;
use crate::store::DynStore;
use crate::traits::{Basic, KvIterator, Ordered, Transaction, Transactional};
use crate::tuple::{Element, Tuple};

use super::Subspace;

/// A store whose keys all live inside one [`Subspace`].
///
/// ```
/// use kvspace::{Basic, Context, Subspaced, tuple};
/// use kvspace::databases::redb_store::RedbStore;
/// use std::sync::Arc;
///
/// let ctx = Context::new();
/// let store = Arc::new(RedbStore::temp().unwrap());
/// let tenant_a = Subspaced::new(Arc::clone(&store), &tuple!["tenant", "a"]);
/// let tenant_b = Subspaced::new(store, &tuple!["tenant", "b"]);
///
/// tenant_a.put(&ctx, b"config", b"1").unwrap();
/// assert!(tenant_b.get(&ctx, b"config").unwrap_err().is_not_found());
/// ```
#[derive(Debug, Clone)]
pub struct Subspaced<S> {
    inner: S,
    subspace: Subspace,
}

impl<S> Subspaced<S> {
    pub fn new(inner: S, prefix: &Tuple) -> Self {
        Self::with_subspace(inner, Subspace::new(prefix))
    }

    pub fn with_subspace(inner: S, subspace: Subspace) -> Self {
        Self { inner, subspace }
    }

    pub fn subspace(&self) -> &Subspace {
        &self.subspace
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Clone> Subspaced<S> {
    /// A view of the child subspace `prefix ++ (element,)` over the same store.
    pub fn nested(&self, element: impl Into<Element>) -> Self {
        Self {
            inner: self.inner.clone(),
            subspace: self.subspace.sub(element),
        }
    }
}

impl Subspaced<DynStore> {
    /// Open a store from a connection descriptor and scope it to `prefix`.
    pub fn open(uri: &str, prefix: &Tuple) -> KvResult<Self> {
        let store = registry::open(uri)?;
        debug!("opened subspaced store at {prefix:?}");
        Ok(Self::new(store, prefix))
    }
}

impl<S: Basic> Basic for Subspaced<S> {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        self.inner.get(ctx, &self.subspace.pack_key(key))
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.inner.put(ctx, &self.subspace.pack_key(key), value)
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        self.inner.delete(ctx, &self.subspace.pack_key(key))
    }
}

impl<S: Transactional> Transactional for Subspaced<S> {
    type Txn = SubspacedTransaction<S::Txn>;

    fn new_transaction(&self, ctx: &Context, read_only: bool) -> KvResult<Self::Txn> {
        Ok(SubspacedTransaction {
            inner: self.inner.new_transaction(ctx, read_only)?,
            subspace: self.subspace.clone(),
        })
    }
}

/// A transaction confined to one subspace.
pub struct SubspacedTransaction<T> {
    inner: T,
    subspace: Subspace,
}

impl<T> SubspacedTransaction<T> {
    pub fn subspace(&self) -> &Subspace {
        &self.subspace
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Basic> Basic for SubspacedTransaction<T> {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        self.inner.get(ctx, &self.subspace.pack_key(key))
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.inner.put(ctx, &self.subspace.pack_key(key), value)
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        self.inner.delete(ctx, &self.subspace.pack_key(key))
    }
}

impl<T: Ordered> Ordered for SubspacedTransaction<T> {
    type Iter = SubspacedIterator<T::Iter>;

    fn seek(&self, ctx: &Context, start: &[u8]) -> KvResult<Self::Iter> {
        let inner = self.inner.seek(ctx, &self.subspace.pack_key(start))?;
        let (_, end) = self.subspace.range();
        Ok(SubspacedIterator {
            inner,
            subspace: self.subspace.clone(),
            end,
            done: false,
        })
    }
}

impl<T: Transaction> Transaction for SubspacedTransaction<T> {
    fn discard(&self, ctx: &Context) -> KvResult<()> {
        self.inner.discard(ctx)
    }

    fn commit(&self, ctx: &Context) -> KvResult<()> {
        self.inner.commit(ctx)
    }
}

/// Yields local keys of one subspace and stops at its end.
pub struct SubspacedIterator<I> {
    inner: I,
    subspace: Subspace,
    end: Vec<u8>,
    done: bool,
}

impl<I: KvIterator> SubspacedIterator<I> {
    fn local_key(&self, raw: &[u8]) -> KvResult<Vec<u8>> {
        let tuple = self.subspace.unpack(raw)?;
        match tuple.into_iter().last() {
            Some(Element::Bytes(key)) => Ok(key),
            Some(other) => Err(DecodeError::UnexpectedShape(other.kind().to_string()).into()),
            None => Err(DecodeError::UnexpectedShape("empty tuple".to_string()).into()),
        }
    }
}

impl<I: KvIterator> KvIterator for SubspacedIterator<I> {
    fn next(&mut self, ctx: &Context) -> KvResult<(Vec<u8>, Vec<u8>)> {
        if self.done {
            return Err(KvError::exhausted());
        }
        let (raw, value) = self.inner.next(ctx)?;
        if raw >= self.end {
            self.done = true;
            return Err(KvError::exhausted());
        }
        match self.local_key(&raw) {
            Ok(key) => Ok((key, value)),
            Err(err) => {
                self.done = true;
                Err(err)
            }
        }
    }

    fn close(&mut self) -> KvResult<()> {
        self.inner.close()
    }
}
