//! Adapter for the [sled](https://docs.rs/sled) embedded database.
//!
//! Records live in sled's default tree; sled orders keys byte-wise.
//!
//! # Isolation
//!
//! sled has no snapshots, so this adapter offers a weaker guarantee than the
//! other backends: reads inside a [`SledTransaction`] are read-committed
//! against the live tree, overlaid with the transaction's own buffered
//! writes. A concurrent commit can therefore become visible halfway through a
//! scan. Writes are still all-or-nothing: `commit` applies the buffered puts
//! and deletes as one atomic [`sled::Batch`].
//!
//! # Module Structure
//!
//! - `store.rs` - [`SledStore`], construction and autocommit operations
//! - `transaction.rs` - [`SledTransaction`]
//! - `iterator.rs` - [`SledIterator`] wrapping a native [`sled::Iter`]
//!
//! # Examples
//!
//! ```
//! use kvspace::{Context, Basic, Transaction, Transactional};
//! use kvspace::databases::sled_store::SledStore;
//!
//! let ctx = Context::new();
//! let store = SledStore::temp().unwrap();
//!
//! let txn = store.new_transaction(&ctx, false).unwrap();
//! txn.put(&ctx, b"user/1", b"alice").unwrap();
//! assert!(store.get(&ctx, b"user/1").unwrap_err().is_not_found());
//! txn.commit(&ctx).unwrap();
//!
//! assert_eq!(store.get(&ctx, b"user/1").unwrap(), b"alice".to_vec());
//! ```

pub mod iterator;
pub mod store;
pub mod transaction;

pub use iterator::SledIterator;
pub use store::SledStore;
pub use transaction::SledTransaction;
