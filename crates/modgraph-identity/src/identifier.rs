// identifier.rs
//
// Interned name token.

/// Interned name token. Two identifiers are equal iff they were interned
/// from the same string by the same [`Interner`](crate::Interner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(u32);

impl Identifier {
    /// The empty identifier (index 0). Every interner reserves it.
    pub const EMPTY: Self = Self(0);

    /// Create an Identifier from a raw index. Only the interner should use this.
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the underlying index.
    pub fn index(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::EMPTY
    }
}
