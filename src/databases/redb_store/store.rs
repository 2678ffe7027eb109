//! RedbStore implementation
//!
//! This module contains the store struct, its constructors and the
//! autocommit `Basic` operations.

use std::path::Path;
use std::sync::Arc;

use log::debug;
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableDatabase};

use crate::config::RedbConfig;
use crate::context::Context;
use crate::error::{ConfigError, KvError, KvResult};
use crate::traits::{Basic, Transactional};

use super::KV_TABLE;
use super::transaction::RedbTransaction;

/// Ordered transactional store backed by a redb database.
///
/// The database handle is shared between the store and every transaction it
/// opens, so transactions may outlive a clone of the store.
pub struct RedbStore {
    pub(crate) db: Arc<Database>,
}

impl RedbStore {
    pub fn new(config: RedbConfig) -> KvResult<Self> {
        let mut builder = Database::builder();
        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }
        let db = if config.memory {
            builder.create_with_backend(InMemoryBackend::new())?
        } else {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| ConfigError::MissingLocation("redb".to_string()))?;
            builder.create(path)?
        };
        debug!(
            "opened redb store (memory: {}, path: {:?})",
            config.memory, config.path
        );
        Self::from_database(db)
    }

    /// Create or open a database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> KvResult<Self> {
        Self::new(RedbConfig::new(path.as_ref()))
    }

    /// An in-memory database, discarded when the last handle drops.
    pub fn temp() -> KvResult<Self> {
        Self::new(RedbConfig::temp())
    }

    /// Adopt an already opened redb database, creating the `kv` table if needed.
    pub fn from_database(db: Database) -> KvResult<Self> {
        let txn = db.begin_write()?;
        txn.open_table(KV_TABLE)?;
        txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Direct access to the underlying redb database
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Compact the database file.
    ///
    /// Fails with [`KvError::StoreInUse`] while any transaction opened from
    /// this store is still alive, since they share the database handle.
    pub fn compact(&mut self) -> KvResult<bool> {
        let handles = Arc::strong_count(&self.db);
        let db = Arc::get_mut(&mut self.db).ok_or(KvError::StoreInUse { handles })?;
        Ok(db.compact()?)
    }

    /// Release this handle. The file is closed once every transaction opened
    /// from the store has ended too.
    pub fn close(self) -> KvResult<()> {
        debug!(
            "closing redb store ({} handles)",
            Arc::strong_count(&self.db)
        );
        Ok(())
    }
}

impl Basic for RedbStore {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        ctx.check()?;
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        value.ok_or_else(KvError::missing_key)
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        ctx.check()?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        ctx.check()?;
        let txn = self.db.begin_write()?;
        let mut table = txn.open_table(KV_TABLE)?;
        let removed = table.remove(key)?.is_some();
        drop(table);
        if removed {
            txn.commit()?;
            Ok(())
        } else {
            txn.abort()?;
            Err(KvError::missing_key())
        }
    }
}

impl Transactional for RedbStore {
    type Txn = RedbTransaction;

    fn new_transaction(&self, ctx: &Context, read_only: bool) -> KvResult<RedbTransaction> {
        ctx.check()?;
        RedbTransaction::begin(Arc::clone(&self.db), read_only)
    }
}
