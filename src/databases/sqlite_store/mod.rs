//! Adapter for SQLite through [rusqlite](https://docs.rs/rusqlite).
//!
//! Records live in a single table:
//!
//! ```sql
//! CREATE TABLE kv (key BLOB PRIMARY KEY NOT NULL, value BLOB NOT NULL) WITHOUT ROWID
//! ```
//!
//! SQLite compares BLOBs with `memcmp` and shorter-prefix-first, so
//! `ORDER BY key` is byte-wise lexicographic order.
//!
//! # Isolation
//!
//! Writes made in a [`SqliteTransaction`] are buffered and applied at commit
//! in one `BEGIN IMMEDIATE` transaction on the store's connection; concurrent
//! transactions writing the same key resolve as last committer wins.
//!
//! For file databases each transaction also opens its own connection, begins
//! a read transaction and reads once, which pins a WAL snapshot for its whole
//! lifetime. In-memory databases are private to a single connection, so their
//! transactions read committed data overlaid with their own writes instead.
//!
//! # Module Structure
//!
//! - `store.rs` - [`SqliteStore`], schema, SQL helpers and autocommit operations
//! - `transaction.rs` - [`SqliteTransaction`]
//! - `iterator.rs` - [`SqliteIterator`] paging rows by key

pub mod iterator;
pub mod store;
pub mod transaction;

pub use iterator::SqliteIterator;
pub use store::SqliteStore;
pub use transaction::SqliteTransaction;
