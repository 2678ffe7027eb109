//! Capability interfaces every backend adapter and every wrapper satisfies.
//!
//! - [`Basic`]: point reads, upserts and deletes.
//! - [`Ordered`]: `Basic` plus [`Ordered::seek`] for ascending byte-wise scans.
//! - [`Transaction`]: `Ordered` plus [`Transaction::commit`] and
//!   [`Transaction::discard`].
//! - [`Transactional`]: `Basic` plus [`Transactional::new_transaction`].
//! - [`KvIterator`]: the cursor returned by `seek`.
//!
//! Wrappers such as [`crate::Subspaced`] and [`crate::StringKeyed`] depend on
//! these traits only, never on a backend type.

pub mod iterator;
pub mod store;
pub mod transaction;

pub use iterator::{KvIterator, collect, collect_n};
pub use store::{Basic, Ordered, Transactional};
pub use transaction::Transaction;
