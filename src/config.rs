//! Backend configuration and connection descriptors.
//!
//! Every adapter can be built from a typed configuration (builder pattern via
//! `typed-builder`) or from a connection descriptor such as
//! `redb:///var/lib/app/kv.redb` or `sqlite:///?memory=true`. Descriptors are
//! validated eagerly: an unknown scheme, an unknown option or an unparsable
//! value is a [`ConfigError`] at construction, never at first use.
//!
//! # Examples
//!
//! ```
//! use kvspace::config::{ConnectionDescriptor, RedbConfig};
//!
//! let config = RedbConfig::builder().memory(true).build();
//! assert!(config.memory);
//!
//! let descriptor = ConnectionDescriptor::parse("redb:///tmp/kv.redb?cache_size=1048576").unwrap();
//! let config = RedbConfig::from_descriptor(&descriptor).unwrap();
//! assert_eq!(config.cache_size, Some(1_048_576));
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use typed_builder::TypedBuilder;
use url::Url;

use crate::error::ConfigError;

/// Schemes served by the built-in adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
pub enum Scheme {
    #[strum(serialize = "sled")]
    Sled,
    #[strum(serialize = "redb")]
    Redb,
    #[strum(to_string = "sqlite", serialize = "sqlite3")]
    Sqlite,
}

/// A parsed connection descriptor.
///
/// The scheme selects the backend, the authority and path give the location
/// and query parameters carry engine options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    scheme: String,
    location: Option<PathBuf>,
    options: BTreeMap<String, String>,
}

impl ConnectionDescriptor {
    pub fn parse(uri: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(uri)?;

        let mut location = String::new();
        if let Some(host) = url.host_str() {
            location.push_str(&decode_component(host)?);
        }
        let path = decode_component(url.path())?;
        if location.is_empty() {
            location = path;
        } else if path != "/" {
            location.push_str(&path);
        }
        let location = match location.as_str() {
            "" | "/" => None,
            _ => Some(PathBuf::from(location)),
        };

        let mut options = BTreeMap::new();
        for (name, value) in url.query_pairs() {
            options.insert(name.into_owned(), value.into_owned());
        }

        Ok(Self {
            scheme: url.scheme().to_ascii_lowercase(),
            location,
            options,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn location(&self) -> Option<&PathBuf> {
        self.location.as_ref()
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Reject every option not listed in `known`.
    pub fn expect_options(&self, known: &[&str]) -> Result<(), ConfigError> {
        match self.options.keys().find(|name| !known.contains(&name.as_str())) {
            Some(unknown) => Err(ConfigError::UnknownOption {
                scheme: self.scheme.clone(),
                option: unknown.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn parse_option<T: FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        self.option(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| ConfigError::InvalidOption {
                    option: name.to_string(),
                    value: raw.to_string(),
                })
            })
            .transpose()
    }

    /// Resolve `location` and the `memory` flag into exactly one of the two.
    fn storage_target(&self) -> Result<(Option<PathBuf>, bool), ConfigError> {
        let memory = self.parse_option::<bool>("memory")?.unwrap_or(false);
        match (&self.location, memory) {
            (Some(_), true) => Err(ConfigError::ConflictingLocation(self.scheme.clone())),
            (None, false) => Err(ConfigError::MissingLocation(self.scheme.clone())),
            (location, memory) => Ok((location.clone(), memory)),
        }
    }
}

/// Percent-decode one URI component, rejecting bytes that are not UTF-8.
fn decode_component(raw: &str) -> Result<String, ConfigError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ConfigError::InvalidOption {
            option: "location".to_string(),
            value: raw.to_string(),
        })
}

/// Configuration for the sled adapter.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct SledConfig {
    /// Directory holding the sled files; ignored when `memory` is set
    #[builder(default, setter(strip_option, into))]
    pub path: Option<PathBuf>,

    /// Use a temporary database removed on drop
    #[builder(default = false)]
    pub memory: bool,

    /// Page cache size in bytes
    #[builder(default, setter(strip_option))]
    pub cache_capacity: Option<u64>,

    /// Background flush interval; `None` keeps sled's default
    #[builder(default, setter(strip_option))]
    pub flush_every_ms: Option<u64>,
}

impl SledConfig {
    pub const OPTIONS: &'static [&'static str] = &["memory", "cache_capacity", "flush_every_ms"];

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::builder().path(path).build()
    }

    pub fn temp() -> Self {
        Self::builder().memory(true).build()
    }

    pub fn from_descriptor(descriptor: &ConnectionDescriptor) -> Result<Self, ConfigError> {
        descriptor.expect_options(Self::OPTIONS)?;
        let (path, memory) = descriptor.storage_target()?;
        Ok(Self {
            path,
            memory,
            cache_capacity: descriptor.parse_option("cache_capacity")?,
            flush_every_ms: descriptor.parse_option("flush_every_ms")?,
        })
    }
}

/// Configuration for the redb adapter.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct RedbConfig {
    /// Database file; ignored when `memory` is set
    #[builder(default, setter(strip_option, into))]
    pub path: Option<PathBuf>,

    /// Keep the whole database in memory
    #[builder(default = false)]
    pub memory: bool,

    /// Cache size in bytes
    #[builder(default, setter(strip_option))]
    pub cache_size: Option<usize>,
}

impl RedbConfig {
    pub const OPTIONS: &'static [&'static str] = &["memory", "cache_size"];

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::builder().path(path).build()
    }

    pub fn temp() -> Self {
        Self::builder().memory(true).build()
    }

    pub fn from_descriptor(descriptor: &ConnectionDescriptor) -> Result<Self, ConfigError> {
        descriptor.expect_options(Self::OPTIONS)?;
        let (path, memory) = descriptor.storage_target()?;
        Ok(Self {
            path,
            memory,
            cache_size: descriptor.parse_option("cache_size")?,
        })
    }
}

/// Configuration for the SQLite adapter.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct SqliteConfig {
    /// Database file; ignored when `memory` is set
    #[builder(default, setter(strip_option, into))]
    pub path: Option<PathBuf>,

    /// Use an in-memory database private to this store
    #[builder(default = false)]
    pub memory: bool,

    /// How long a connection waits on a locked database
    #[builder(default = Duration::from_secs(5))]
    pub busy_timeout: Duration,
}

impl SqliteConfig {
    pub const OPTIONS: &'static [&'static str] = &["memory", "busy_timeout_ms"];

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::builder().path(path).build()
    }

    pub fn temp() -> Self {
        Self::builder().memory(true).build()
    }

    pub fn from_descriptor(descriptor: &ConnectionDescriptor) -> Result<Self, ConfigError> {
        descriptor.expect_options(Self::OPTIONS)?;
        let (path, memory) = descriptor.storage_target()?;
        let busy_timeout = descriptor
            .parse_option::<u64>("busy_timeout_ms")?
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(5));
        Ok(Self {
            path,
            memory,
            busy_timeout,
        })
    }
}
