//! # kvspace
//!
//! A backend-agnostic contract for ordered, transactional key-value stores,
//! plus a tuple-encoded namespacing layer that splits one physical store into
//! many isolated logical key spaces.
//!
//! ## Features
//!
//! - **One contract, several engines**: sled, redb and SQLite adapters with
//!   identical ordering, isolation and error behavior
//! - **Transactions**: explicit commit/discard, read-only transactions, drop
//!   discards
//! - **Ordered iteration**: `seek` + `next` in byte-wise key order, with a
//!   transaction's own writes merged in
//! - **Subspaces**: order-preserving tuple prefixes that never overlap and
//!   nest cleanly
//! - **Runtime dispatch**: open any built-in backend from a connection
//!   descriptor such as `sqlite:///var/lib/app/kv.db`
//!
//! ## Quick Start
//!
//! ```rust
//! use kvspace::prelude::*;
//!
//! let ctx = Context::new();
//! let store = kvspace::open("redb:///?memory=true")?;
//!
//! let users = Subspaced::new(store, &tuple!["users"]);
//! users.update(&ctx, |txn| {
//!     txn.put(&ctx, b"alice", b"admin")?;
//!     txn.put(&ctx, b"bob", b"reader")
//! })?;
//!
//! let names = users.view(&ctx, |txn| collect(txn.seek(&ctx, b"")?, &ctx))?;
//! assert_eq!(names[0], (b"alice".to_vec(), b"admin".to_vec()));
//! assert_eq!(names.len(), 2);
//! # Ok::<(), kvspace::KvError>(())
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`KvResult`]. An absent key and an exhausted
//! iterator are both [`KvError::NotFound`] (check with
//! [`KvError::is_not_found`]); every other engine failure arrives unmodified
//! inside [`BackendError`].

pub mod config;
pub mod context;
pub mod databases;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod store;
pub mod string_keyed;
pub mod subspace;
pub mod traits;
pub mod transaction;
pub mod tuple;

pub use context::Context;
pub use error::{BackendError, ConfigError, DecodeError, KvError, KvResult};
pub use registry::{Registry, open};
pub use store::{DynIterator, DynStore, DynTransaction, erase};
pub use string_keyed::StringKeyed;
pub use subspace::{Subspace, Subspaced};
pub use traits::{Basic, KvIterator, Ordered, Transaction, Transactional, collect, collect_n};
pub use transaction::TxnStatus;
pub use tuple::{Element, Tuple};
