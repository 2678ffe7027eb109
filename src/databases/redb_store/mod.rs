//! Adapter for the [redb](https://docs.rs/redb) embedded B-tree store.
//!
//! All records live in one redb table named `kv` with `&[u8]` keys and
//! values; redb orders `&[u8]` keys byte-wise, which is exactly the ordering
//! the capability contract requires.
//!
//! # Isolation
//!
//! A [`RedbTransaction`] pins a redb read snapshot when it is opened and
//! buffers its own writes. Reads and scans see the snapshot overlaid with
//! those writes. `commit` applies the buffered writes inside a single redb
//! write transaction, so they land atomically. Because redb serializes write
//! transactions, holding one open per caller would block every other writer;
//! buffering avoids that at the cost of conflict detection: concurrent
//! transactions writing the same key resolve as last committer wins.
//!
//! # Module Structure
//!
//! - `store.rs` - [`RedbStore`], construction and autocommit operations
//! - `transaction.rs` - [`RedbTransaction`]
//! - `iterator.rs` - [`RedbIterator`] paging through the snapshot
//!
//! # Examples
//!
//! ```
//! use kvspace::{Context, Basic, Ordered, Transaction, Transactional, KvIterator};
//! use kvspace::databases::redb_store::RedbStore;
//!
//! let ctx = Context::new();
//! let store = RedbStore::temp().unwrap();
//! store.put(&ctx, b"a", b"1").unwrap();
//!
//! let txn = store.new_transaction(&ctx, false).unwrap();
//! txn.put(&ctx, b"b", b"2").unwrap();
//! let mut iter = txn.seek(&ctx, b"").unwrap();
//! assert_eq!(iter.next(&ctx).unwrap(), (b"a".to_vec(), b"1".to_vec()));
//! assert_eq!(iter.next(&ctx).unwrap(), (b"b".to_vec(), b"2".to_vec()));
//! assert!(iter.next(&ctx).unwrap_err().is_not_found());
//! iter.close().unwrap();
//! txn.commit(&ctx).unwrap();
//! ```

pub mod iterator;
pub mod store;
pub mod transaction;

pub use iterator::RedbIterator;
pub use store::RedbStore;
pub use transaction::RedbTransaction;

use redb::TableDefinition;

pub(crate) const KV_TABLE: TableDefinition<'static, &'static [u8], &'static [u8]> =
    TableDefinition::new("kv");

/// A pinned read view of the `kv` table.
pub(crate) type Snapshot = redb::ReadOnlyTable<&'static [u8], &'static [u8]>;
