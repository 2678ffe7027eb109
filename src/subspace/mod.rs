//! Key namespaces carved out of one ordered store.
//!
//! A [`Subspace`] owns every key that starts with its packed tuple prefix.
//! Because tuple encoding is order preserving and prefix free, two subspaces
//! built from different tuples never share a key, and a subspace built with
//! [`Subspace::sub`] sits strictly inside its parent's range.
//!
//! [`Subspaced`] applies a subspace to a whole [`crate::Transactional`] store:
//! callers keep using plain byte keys and the wrapper packs them as
//! `prefix ++ pack((key,))` on the way in and strips the prefix on the way
//! out.
//!
//! ```
//! use kvspace::subspace::Subspace;
//! use kvspace::tuple;
//!
//! let users = Subspace::new(&tuple!["app", "users"]);
//! let admins = users.sub("admins");
//!
//! let key = admins.pack_key(b"root");
//! assert!(users.contains(&key));
//! assert!(admins.contains(&key));
//! assert!(!Subspace::new(&tuple!["app", "orders"]).contains(&key));
//!
//! let (begin, end) = admins.range();
//! assert!(begin.as_slice() < key.as_slice() && key.as_slice() < end.as_slice());
//! ```

mod subspaced;

pub use subspaced::{Subspaced, SubspacedIterator, SubspacedTransaction};

use crate::error::DecodeError;
use crate::tuple::{self, Element, Tuple};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Subspace {
    prefix: Vec<u8>,
}

impl Subspace {
    /// The subspace of keys starting with `pack(prefix)`.
    pub fn new(prefix: &Tuple) -> Self {
        Self {
            prefix: tuple::pack(prefix),
        }
    }

    /// A subspace with a raw, already encoded prefix.
    pub fn from_bytes(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The subspace covering every tuple-encoded key.
    pub fn all() -> Self {
        Self::default()
    }

    /// The child subspace `prefix ++ pack((element,))`.
    pub fn sub(&self, element: impl Into<Element>) -> Subspace {
        let mut prefix = self.prefix.clone();
        tuple::pack_into(&Tuple(vec![element.into()]), &mut prefix);
        Subspace { prefix }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.prefix
    }

    pub fn pack(&self, tuple: &Tuple) -> Vec<u8> {
        let mut key = self.prefix.clone();
        tuple::pack_into(tuple, &mut key);
        key
    }

    /// The physical key for a caller's local byte key.
    pub fn pack_key(&self, key: &[u8]) -> Vec<u8> {
        self.pack(&Tuple(vec![Element::Bytes(key.to_vec())]))
    }

    /// Decode the tuple that follows the prefix.
    pub fn unpack(&self, key: &[u8]) -> Result<Tuple, DecodeError> {
        let rest = key
            .strip_prefix(self.prefix.as_slice())
            .ok_or(DecodeError::PrefixMismatch)?;
        tuple::unpack(rest)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key.starts_with(&self.prefix)
    }

    /// `(prefix ++ 0x00, prefix ++ 0xFF)`: every packed key of this subspace
    /// lies strictly between the two.
    pub fn range(&self) -> (Vec<u8>, Vec<u8>) {
        let mut begin = self.prefix.clone();
        begin.push(0x00);
        let mut end = self.prefix.clone();
        end.push(0xFF);
        (begin, end)
    }
}
