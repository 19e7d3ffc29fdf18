// intern.rs
//
// String interning for Identifier tokens.

use std::hash::BuildHasher;

use crate::Identifier;
use rustc_hash::FxBuildHasher;

/// Interns strings to unique Identifier tokens
#[derive(Debug, Clone)]
pub struct Interner {
    map: hashbrown::HashMap<String, Identifier, FxBuildHasher>,
    strings: Vec<String>,
}

impl Default for Interner {
    fn default() -> Self {
        let mut interner = Self {
            map: hashbrown::HashMap::with_hasher(FxBuildHasher),
            strings: Vec::new(),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Identifier::EMPTY);
        interner
    }
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Identifier {
        use hashbrown::hash_map::RawEntryMut;

        // Hash once, reuse for both lookup and insert.
        let hash = self.map.hasher().hash_one(s);

        let entry = self.map.raw_entry_mut().from_hash(hash, |k| k == s);

        match entry {
            RawEntryMut::Occupied(e) => *e.get(),
            RawEntryMut::Vacant(e) => {
                let id = Identifier::new(self.strings.len() as u32);
                let owned = s.to_string();
                self.strings.push(owned.clone());
                e.insert_hashed_nocheck(hash, owned, id);
                id
            }
        }
    }

    pub fn resolve(&self, id: Identifier) -> &str {
        &self.strings[id.index() as usize]
    }

    /// Returns the number of interned strings, including the empty identifier.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing besides the empty identifier has been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }

    /// Look up a string to get its identifier, if it has been interned.
    pub fn lookup(&self, s: &str) -> Option<Identifier> {
        self.map.get(s).copied()
    }

    /// Join identifiers with `sep`, e.g. for dotted module names.
    pub fn join(&self, ids: impl IntoIterator<Item = Identifier>, sep: &str) -> String {
        let mut out = String::new();
        for (idx, id) in ids.into_iter().enumerate() {
            if idx > 0 {
                out.push_str(sep);
            }
            out.push_str(self.resolve(id));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_identifier() {
        let mut interner = Interner::new();
        let s1 = interner.intern("hello");
        let s2 = interner.intern("hello");
        let s3 = interner.intern("world");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
    }

    #[test]
    fn resolve_returns_original_string() {
        let mut interner = Interner::new();
        let id = interner.intern("test");
        assert_eq!(interner.resolve(id), "test");
    }

    #[test]
    fn empty_string_is_reserved() {
        let mut interner = Interner::new();
        assert!(interner.is_empty());
        assert_eq!(interner.intern(""), Identifier::EMPTY);
        assert_eq!(interner.lookup(""), Some(Identifier::EMPTY));
        assert_eq!(interner.lookup("missing"), None);
    }

    #[test]
    fn no_case_folding() {
        let mut interner = Interner::new();
        assert_ne!(interner.intern("Foo"), interner.intern("foo"));
    }

    #[test]
    fn join_dotted() {
        let mut interner = Interner::new();
        let a = interner.intern("Darwin");
        let b = interner.intern("C");
        assert_eq!(interner.join([a, b], "."), "Darwin.C");
    }
}
