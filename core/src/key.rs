//! Identity hints attached to descriptors.

use std::borrow::Cow;
use std::fmt;

/// Explicit identity of a descriptor among its siblings.
///
/// Keys let the reconciler recognise a child that moved instead of tearing it down
/// and creating a new one in its place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A textual key, the common case for lists rendered from data.
    Str(Cow<'static, str>),
    /// A numeric key.
    Int(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(key) => f.write_str(key),
            Self::Int(key) => write!(f, "{key}"),
        }
    }
}

impl From<&'static str> for Key {
    fn from(value: &'static str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

/// Lookup domain used when matching remaining children by identity.
///
/// A child carrying an explicit [`Key`] is looked up by that key; a child without
/// one falls back to its position among its siblings. The two domains never
/// collide: `Key::Int(0)` and `Index(0)` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// Explicit key.
    Key(Key),
    /// Positional index among siblings.
    Index(usize),
}

impl LookupKey {
    /// Builds the lookup key for a child at `index` with an optional explicit key.
    #[must_use]
    pub fn new(key: Option<&Key>, index: usize) -> Self {
        key.map_or(Self::Index(index), |key| Self::Key(key.clone()))
    }
}
