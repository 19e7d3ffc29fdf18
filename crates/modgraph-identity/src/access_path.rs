// access_path.rs
//
// Qualified import paths. Equality and hashing ignore source spans.

use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::{DeclName, Identifier, Interner, Span};

/// One `(identifier, location)` component of an access path.
#[derive(Debug, Clone, Copy)]
pub struct AccessPathElement {
    pub name: Identifier,
    pub span: Span,
}

/// An ordered sequence of identifiers naming what an import brings into scope.
///
/// An empty path imports the whole module; `import func Foo.bar` produces the
/// single-element path `[bar]`. Two paths are equal when their identifier
/// sequences are equal, wherever they were written.
#[derive(Debug, Clone, Default)]
pub struct AccessPath(SmallVec<[AccessPathElement; 1]>);

impl AccessPath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(name: Identifier, span: Span) -> Self {
        let mut elements = SmallVec::new();
        elements.push(AccessPathElement { name, span });
        Self(elements)
    }

    pub fn from_elements(elements: impl IntoIterator<Item = AccessPathElement>) -> Self {
        Self(elements.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn elements(&self) -> &[AccessPathElement] {
        &self.0
    }

    pub fn first(&self) -> Option<Identifier> {
        self.0.first().map(|e| e.name)
    }

    pub fn names(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.0.iter().map(|e| e.name)
    }

    /// Whether two paths denote the same identifier sequence.
    pub fn is_same(&self, other: &AccessPath) -> bool {
        self.0.len() == other.0.len() && self.names().eq(other.names())
    }

    /// Whether a lookup of `name` is allowed through this path.
    ///
    /// Only single-level paths can be expressed; longer paths are a caller bug
    /// and only their first component is considered in release builds.
    pub fn matches(&self, name: &DeclName) -> bool {
        debug_assert!(self.0.len() <= 1, "can only refer to top-level decls");
        match self.first() {
            None => true,
            Some(first) => DeclName::simple(first).matches_ref(name),
        }
    }

    /// Two paths are compatible when one of them is empty or both name the
    /// same sequence.
    pub fn is_compatible(&self, other: &AccessPath) -> bool {
        self.is_empty() || other.is_empty() || self.is_same(other)
    }

    pub fn display(&self, interner: &Interner) -> String {
        interner.join(self.names(), ".")
    }
}

impl PartialEq for AccessPath {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl Eq for AccessPath {}

impl Hash for AccessPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for name in self.names() {
            name.hash(state);
        }
    }
}

impl PartialOrd for AccessPath {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccessPath {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.names().cmp(other.names())
    }
}
