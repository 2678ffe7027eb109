//! Error taxonomy shared by every store, wrapper and codec in the crate.
//!
//! Only "record not found" is normalized across backends. Every other engine
//! failure is carried inside [`BackendError`] with its native type intact so
//! callers can inspect it, and must be treated as fatal to the operation.

use thiserror::Error;

pub type KvResult<T> = Result<T, KvError>;

#[derive(Error, Debug)]
pub enum KvError {
    /// The key is absent, or the iterator has no more records.
    #[error("record not found")]
    NotFound(Missing),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("transaction has already been committed or discarded")]
    UseAfterEnd,

    #[error("write rejected by read-only transaction")]
    ReadOnly,

    #[error("operation cancelled")]
    Cancelled,

    /// An operation that needs the only handle to the store found others alive.
    #[error("store is shared by {handles} live handles")]
    StoreInUse { handles: usize },
}

/// Internal tag behind [`KvError::NotFound`].
///
/// The public contract reports both conditions as the same kind; the tag only
/// exists so the crate itself never confuses the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Key,
    Exhausted,
}

impl KvError {
    pub(crate) fn missing_key() -> Self {
        KvError::NotFound(Missing::Key)
    }

    pub(crate) fn exhausted() -> Self {
        KvError::NotFound(Missing::Exhausted)
    }

    /// True for both an absent key and an exhausted iterator.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::NotFound(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, KvError::NotFound(Missing::Exhausted))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid connection descriptor: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error("no backend registered for scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("backend `{scheme}` does not accept option `{option}`")]
    UnknownOption { scheme: String, option: String },

    #[error("invalid value `{value}` for option `{option}`")]
    InvalidOption { option: String, value: String },

    #[error("backend `{0}` needs a path or memory=true")]
    MissingLocation(String),

    #[error("backend `{0}` cannot take both a path and memory=true")]
    ConflictingLocation(String),
}

/// Engine failures passed through unmodified.
#[derive(Error, Debug)]
pub enum BackendError {
    #[cfg(feature = "sled")]
    #[error(transparent)]
    Sled(#[from] sled::Error),

    #[cfg(feature = "redb")]
    #[error(transparent)]
    Redb(#[from] RedbError),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "redb")]
#[derive(Error, Debug)]
pub enum RedbError {
    #[error(transparent)]
    DatabaseError(#[from] redb::DatabaseError),
    #[error(transparent)]
    TransactionError(#[from] redb::TransactionError),
    #[error(transparent)]
    TableError(#[from] redb::TableError),
    #[error(transparent)]
    CommitError(#[from] redb::CommitError),
    #[error(transparent)]
    StorageError(#[from] redb::StorageError),
    #[error(transparent)]
    CompactionError(#[from] redb::CompactionError),
}

#[cfg(feature = "redb")]
macro_rules! impl_from_redb {
    ($($err:ty => $variant:ident),*) => {
        $(
            impl From<$err> for KvError {
                fn from(err: $err) -> Self {
                    KvError::Backend(BackendError::Redb(RedbError::$variant(err)))
                }
            }
        )*
    };
}

#[cfg(feature = "redb")]
impl_from_redb!(
    redb::DatabaseError => DatabaseError,
    redb::TransactionError => TransactionError,
    redb::TableError => TableError,
    redb::CommitError => CommitError,
    redb::StorageError => StorageError,
    redb::CompactionError => CompactionError
);

#[cfg(feature = "sled")]
impl From<sled::Error> for KvError {
    fn from(err: sled::Error) -> Self {
        KvError::Backend(BackendError::Sled(err))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for KvError {
    fn from(err: rusqlite::Error) -> Self {
        KvError::Backend(BackendError::Sqlite(err))
    }
}

impl From<std::io::Error> for KvError {
    fn from(err: std::io::Error) -> Self {
        KvError::Backend(BackendError::Io(err))
    }
}

/// Malformed tuple bytes, or bytes that do not belong to the expected subspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input ended inside an element at offset {0}")]
    Truncated(usize),

    #[error("unknown type code {code:#04x} at offset {offset}")]
    UnknownTypeCode { code: u8, offset: usize },

    #[error("string element is not valid UTF-8")]
    InvalidUtf8,

    #[error("integer at offset {0} does not fit in an i64")]
    IntegerOverflow(usize),

    #[error("integer at offset {0} is not minimally encoded")]
    NonCanonicalInteger(usize),

    #[error("key does not start with the subspace prefix")]
    PrefixMismatch,

    #[error("expected a single trailing byte-string element, found {0}")]
    UnexpectedShape(String),
}
