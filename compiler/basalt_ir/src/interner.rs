//! Sharded string interner for identifier and comment text.
//!
//! The lexer and parser share one interner, so access is synchronized with
//! a per-shard `RwLock`. Lookup and equality on interned `Name`s are O(1).

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

/// Per-shard storage for interned strings.
struct InternShard {
    /// Map from string content to local index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

impl InternShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(128),
        }
    }

    fn with_empty() -> Self {
        let mut shard = Self::new();
        let empty: &'static str = "";
        shard.map.insert(empty, 0);
        shard.strings.push(empty);
        shard
    }
}

/// Sharded string interner.
///
/// The empty string is pre-interned as `Name::EMPTY` in shard 0. Interned
/// strings are leaked; the interner is expected to live for the whole
/// tool invocation, as in the rest of the front end.
pub struct StringInterner {
    shards: [RwLock<InternShard>; Name::NUM_SHARDS],
}

impl StringInterner {
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(InternShard::with_empty())
            } else {
                RwLock::new(InternShard::new())
            }
        });
        Self { shards }
    }

    /// Compute shard for a string based on a cheap prefix hash.
    #[inline]
    fn shard_for(s: &str) -> usize {
        if s.is_empty() {
            return 0;
        }
        let mut hash = 0u32;
        for byte in s.bytes().take(8) {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % Name::NUM_SHARDS
    }

    /// Intern a string, returning its `Name`.
    ///
    /// # Panics
    ///
    /// Panics if a single shard exceeds `Name::MAX_LOCAL` strings.
    pub fn intern(&self, s: &str) -> Name {
        let shard_idx = Self::shard_for(s);
        let shard_tag = shard_idx as u32;

        {
            let shard = self.shards[shard_idx].read();
            if let Some(&local) = shard.map.get(s) {
                return Name::new(shard_tag, local);
            }
        }

        let mut shard = self.shards[shard_idx].write();
        // Re-check under the write lock; another thread may have interned it.
        if let Some(&local) = shard.map.get(s) {
            return Name::new(shard_tag, local);
        }

        let local = u32::try_from(shard.strings.len())
            .ok()
            .filter(|&l| l <= Name::MAX_LOCAL)
            .unwrap_or_else(|| panic!("interner shard {shard_idx} exceeded capacity"));
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        shard.map.insert(leaked, local);
        shard.strings.push(leaked);
        Name::new(shard_tag, local)
    }

    /// Resolve a `Name` back to its string content.
    ///
    /// # Panics
    ///
    /// Panics if the name was not produced by this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        let shard = self.shards[name.shard()].read();
        shard.strings[name.local()]
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_round_trip() {
        let interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        let c = interner.intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.lookup(a), "foo");
        assert_eq!(interner.lookup(c), "bar");
    }

    #[test]
    fn empty_string_is_name_empty() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }
}
