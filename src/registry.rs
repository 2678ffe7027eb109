//! Scheme to backend dispatch.
//!
//! A [`Registry`] maps connection-descriptor schemes to factories producing a
//! [`DynStore`]. Nothing registers itself implicitly: the built-in adapters are
//! added by [`Registry::with_default_backends`], and applications can register
//! their own schemes on top.
//!
//! ```
//! use kvspace::{Basic, Context, Registry};
//!
//! let registry = Registry::with_default_backends();
//! let store = registry.open("redb:///?memory=true").unwrap();
//! store.put(&Context::new(), b"k", b"v").unwrap();
//!
//! assert!(registry.open("postgres://localhost/db").is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use log::debug;
use strum::IntoEnumIterator;

use crate::config::{ConnectionDescriptor, Scheme};
use crate::error::{ConfigError, KvResult};
use crate::store::DynStore;

pub type Factory = Box<dyn Fn(&ConnectionDescriptor) -> KvResult<DynStore> + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every adapter compiled into this build.
    pub fn with_default_backends() -> Self {
        let mut registry = Self::new();
        for scheme in Scheme::iter() {
            let factory: fn(&ConnectionDescriptor) -> KvResult<DynStore> = match scheme {
                #[cfg(feature = "sled")]
                Scheme::Sled => builtin::sled,
                #[cfg(feature = "redb")]
                Scheme::Redb => builtin::redb,
                #[cfg(feature = "sqlite")]
                Scheme::Sqlite => builtin::sqlite,
                #[allow(unreachable_patterns)]
                _ => continue,
            };
            registry.register(scheme.to_string(), factory);
        }
        #[cfg(feature = "sqlite")]
        registry.register("sqlite3", builtin::sqlite);
        registry
    }

    /// Register `factory` for `scheme`, replacing any previous entry.
    pub fn register<F>(&mut self, scheme: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ConnectionDescriptor) -> KvResult<DynStore> + Send + Sync + 'static,
    {
        let scheme = scheme.into().to_ascii_lowercase();
        debug!("registered backend scheme `{scheme}`");
        self.factories.insert(scheme, Box::new(factory));
        self
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.factories.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Parse `uri` and open a store with the factory for its scheme.
    pub fn open(&self, uri: &str) -> KvResult<DynStore> {
        let descriptor = ConnectionDescriptor::parse(uri)?;
        let factory = self
            .factories
            .get(descriptor.scheme())
            .ok_or_else(|| ConfigError::UnsupportedScheme(descriptor.scheme().to_string()))?;
        debug!("opening `{}` store", descriptor.scheme());
        factory(&descriptor)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("schemes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Open `uri` with the built-in adapters.
pub fn open(uri: &str) -> KvResult<DynStore> {
    static DEFAULT: OnceLock<Registry> = OnceLock::new();
    DEFAULT.get_or_init(Registry::with_default_backends).open(uri)
}

#[allow(unused_imports)]
mod builtin {
    use crate::config::ConnectionDescriptor;
    use crate::error::KvResult;
    use crate::store::{DynStore, erase};

    #[cfg(feature = "sled")]
    pub(super) fn sled(descriptor: &ConnectionDescriptor) -> KvResult<DynStore> {
        use crate::config::SledConfig;
        use crate::databases::sled_store::SledStore;

        let config = SledConfig::from_descriptor(descriptor)?;
        Ok(erase(SledStore::new(config)?))
    }

    #[cfg(feature = "redb")]
    pub(super) fn redb(descriptor: &ConnectionDescriptor) -> KvResult<DynStore> {
        use crate::config::RedbConfig;
        use crate::databases::redb_store::RedbStore;

        let config = RedbConfig::from_descriptor(descriptor)?;
        Ok(erase(RedbStore::new(config)?))
    }

    #[cfg(feature = "sqlite")]
    pub(super) fn sqlite(descriptor: &ConnectionDescriptor) -> KvResult<DynStore> {
        use crate::config::SqliteConfig;
        use crate::databases::sqlite_store::SqliteStore;

        let config = SqliteConfig::from_descriptor(descriptor)?;
        Ok(erase(SqliteStore::new(config)?))
    }
}
