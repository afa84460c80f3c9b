//! String interner for identifiers.
//!
//! Provides O(1) interning and lookup. Interning takes `&self` so the
//! interner can be shared by the tree builder and the generator at the
//! same time.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::Name;

struct InternerInner {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

/// String interner.
///
/// Strings are leaked to obtain `'static` lifetimes; an interner lives as
/// long as the compilation that uses it.
pub struct StringInterner {
    inner: RwLock<InternerInner>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned as [`Name::EMPTY`].
    pub fn new() -> Self {
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        StringInterner {
            inner: RwLock::new(InternerInner {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` strings are interned.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned
        if let Some(&index) = self.inner.read().map.get(s) {
            return Name::from_raw(index);
        }

        let mut guard = self.inner.write();
        // Double-check after acquiring write lock
        if let Some(&index) = guard.map.get(s) {
            return Name::from_raw(index);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = u32::try_from(guard.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded capacity of {} strings", u32::MAX));
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Name::from_raw(index)
    }

    /// Look up the string for a Name.
    ///
    /// Names from a different interner resolve to the empty string.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.inner
            .read()
            .strings
            .get(name.index())
            .copied()
            .unwrap_or("")
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Always false: the empty string is pre-interned.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
