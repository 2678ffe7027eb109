//! Order-preserving tuple encoding.
//!
//! A [`Tuple`] is a sequence of typed [`Element`]s packed into bytes such that
//! comparing two packed tuples byte-wise gives the same result as comparing
//! the tuples themselves. The byte layout follows the FoundationDB tuple
//! layer, so keys written here can be read by any implementation of it.
//!
//! | element | type code |
//! |---|---|
//! | `Null` | `0x00` |
//! | `Bytes` | `0x01` |
//! | `String` | `0x02` |
//! | `Nested` | `0x05` |
//! | `Int` | `0x0C..=0x1C` |
//! | `Double` | `0x21` |
//! | `Bool` | `0x26`, `0x27` |
//!
//! # Examples
//!
//! ```
//! use kvspace::tuple;
//! use kvspace::tuple::{Element, pack, unpack};
//!
//! let key = tuple!["users", 42i64, b"alice"];
//! let bytes = pack(&key);
//! assert_eq!(unpack(&bytes).unwrap(), key);
//!
//! assert!(pack(&tuple!["users", 7i64]) < pack(&tuple!["users", 42i64]));
//! assert_eq!(key.last(), Some(&Element::Bytes(b"alice".to_vec())));
//! ```

mod codec;

use std::cmp::Ordering;

use derive_more::From;
use strum::IntoStaticStr;

pub use codec::{pack, unpack};
pub(crate) use codec::pack_into;

/// One typed component of a [`Tuple`].
///
/// Elements order first by type (in the order the variants are declared),
/// then by value. Doubles order by their encoded bits, so `-0.0 < 0.0` and
/// NaNs sort after every other double with the same sign.
#[derive(Debug, Clone, From, IntoStaticStr)]
pub enum Element {
    #[from(skip)]
    Null,
    Bytes(Vec<u8>),
    String(String),
    Nested(Tuple),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl Element {
    fn rank(&self) -> u8 {
        match self {
            Element::Null => 0,
            Element::Bytes(_) => 1,
            Element::String(_) => 2,
            Element::Nested(_) => 3,
            Element::Int(_) => 4,
            Element::Double(_) => 5,
            Element::Bool(_) => 6,
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Element::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Element::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::String(value.to_string())
    }
}

impl From<&[u8]> for Element {
    fn from(value: &[u8]) -> Self {
        Element::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Element {
    fn from(value: &[u8; N]) -> Self {
        Element::Bytes(value.to_vec())
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        Element::Int(value.into())
    }
}

impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Element::Null, Element::Null) => Ordering::Equal,
            (Element::Bytes(a), Element::Bytes(b)) => a.cmp(b),
            (Element::String(a), Element::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Element::Nested(a), Element::Nested(b)) => a.cmp(b),
            (Element::Int(a), Element::Int(b)) => a.cmp(b),
            (Element::Double(a), Element::Double(b)) => {
                codec::order_bits(*a).cmp(&codec::order_bits(*b))
            }
            (Element::Bool(a), Element::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Element {}

/// An ordered sequence of elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tuple(pub Vec<Element>);

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element, builder style.
    pub fn with(mut self, element: impl Into<Element>) -> Self {
        self.0.push(element.into());
        self
    }

    pub fn push(&mut self, element: impl Into<Element>) {
        self.0.push(element.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn elements(&self) -> &[Element] {
        &self.0
    }

    pub fn last(&self) -> Option<&Element> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.0.iter()
    }

    pub fn pack(&self) -> Vec<u8> {
        pack(self)
    }
}

impl From<Vec<Element>> for Tuple {
    fn from(elements: Vec<Element>) -> Self {
        Tuple(elements)
    }
}

impl FromIterator<Element> for Tuple {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Tuple(iter.into_iter().collect())
    }
}

impl IntoIterator for Tuple {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Build a [`Tuple`] from values convertible into [`Element`].
#[macro_export]
macro_rules! tuple {
    () => {
        $crate::tuple::Tuple::new()
    };
    ($($element:expr),+ $(,)?) => {
        $crate::tuple::Tuple::from(vec![$($crate::tuple::Element::from($element)),+])
    };
}
