//! Backend adapters, one per storage engine.
//!
//! Each adapter is behind a cargo feature of the same name and implements
//! [`crate::Transactional`] with its own transaction and iterator types.

#[cfg(feature = "redb")]
pub mod redb_store;

#[cfg(feature = "sled")]
pub mod sled_store;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;

#[cfg(any(feature = "redb", feature = "sled", feature = "sqlite"))]
pub(crate) mod write_set;
