//! SledStore implementation

use std::path::Path;

use log::debug;

use crate::config::SledConfig;
use crate::context::Context;
use crate::error::{ConfigError, KvError, KvResult};
use crate::traits::{Basic, Transactional};

use super::transaction::SledTransaction;

/// Ordered transactional store backed by a sled database.
pub struct SledStore {
    pub(crate) db: sled::Db,
}

impl SledStore {
    pub fn new(config: SledConfig) -> KvResult<Self> {
        let mut sled_config = sled::Config::new();
        if config.memory {
            sled_config = sled_config.temporary(true);
        } else {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| ConfigError::MissingLocation("sled".to_string()))?;
            sled_config = sled_config.path(path);
        }
        if let Some(capacity) = config.cache_capacity {
            sled_config = sled_config.cache_capacity(capacity);
        }
        if let Some(interval) = config.flush_every_ms {
            sled_config = sled_config.flush_every_ms(Some(interval));
        }
        let db = sled_config.open()?;
        debug!(
            "opened sled store (memory: {}, path: {:?})",
            config.memory, config.path
        );
        Ok(Self { db })
    }

    /// Open (or create) a sled database in the directory `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> KvResult<Self> {
        Self::new(SledConfig::new(path.as_ref()))
    }

    /// A temporary database removed when the store is dropped.
    pub fn temp() -> KvResult<Self> {
        Self::new(SledConfig::temp())
    }

    /// Adopt an already opened sled database.
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Direct access to the underlying sled database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Flush dirty pages to disk, returning the number of bytes written.
    pub fn flush(&self) -> KvResult<usize> {
        Ok(self.db.flush()?)
    }

    /// Flush and release the database handle.
    pub fn close(self) -> KvResult<()> {
        self.db.flush()?;
        debug!("closed sled store");
        Ok(())
    }
}

impl Basic for SledStore {
    fn get(&self, ctx: &Context, key: &[u8]) -> KvResult<Vec<u8>> {
        ctx.check()?;
        match self.db.get(key)? {
            Some(value) => Ok(value.to_vec()),
            None => Err(KvError::missing_key()),
        }
    }

    fn put(&self, ctx: &Context, key: &[u8], value: &[u8]) -> KvResult<()> {
        ctx.check()?;
        self.db.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, ctx: &Context, key: &[u8]) -> KvResult<()> {
        ctx.check()?;
        match self.db.remove(key)? {
            Some(_) => Ok(()),
            None => Err(KvError::missing_key()),
        }
    }
}

impl Transactional for SledStore {
    type Txn = SledTransaction;

    fn new_transaction(&self, ctx: &Context, read_only: bool) -> KvResult<SledTransaction> {
        ctx.check()?;
        Ok(SledTransaction::begin(self.db.clone(), read_only))
    }
}
