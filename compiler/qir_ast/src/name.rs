//! Interned identifiers.
//!
//! [`Name`] is a compact 32-bit handle into a [`StringInterner`](crate::StringInterner).
//! [`QualifiedName`] pairs a namespace with a declaration name.

use std::fmt;

/// Interned string identifier.
///
/// Two names are equal exactly when the interned strings are equal.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Create from raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into the interner's storage).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Fully qualified name of a global declaration.
///
/// The namespace is interned as a whole, dots included
/// (e.g. `Microsoft.Quantum.Intrinsic`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct QualifiedName {
    pub namespace: Name,
    pub name: Name,
}

impl QualifiedName {
    #[inline]
    pub const fn new(namespace: Name, name: Name) -> Self {
        QualifiedName { namespace, name }
    }
}
