//! Prelude module for convenient imports.
//!
//! ```rust
//! use kvspace::prelude::*;
//! ```
//!
//! Brings in the capability traits, [`Context`], the error types, the
//! namespacing wrappers and the `tuple!` macro.

pub use crate::context::Context;
pub use crate::error::{KvError, KvResult};
pub use crate::registry::Registry;
pub use crate::store::{DynStore, erase};
pub use crate::string_keyed::StringKeyed;
pub use crate::subspace::{Subspace, Subspaced};
pub use crate::traits::{
    Basic, KvIterator, Ordered, Transaction, Transactional, collect, collect_n,
};
pub use crate::tuple;
pub use crate::tuple::{Element, Tuple};

#[cfg(feature = "redb")]
pub use crate::databases::redb_store::RedbStore;
#[cfg(feature = "sled")]
pub use crate::databases::sled_store::SledStore;
#[cfg(feature = "sqlite")]
pub use crate::databases::sqlite_store::SqliteStore;
