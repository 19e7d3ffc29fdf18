// decl_name.rs
//
// Declaration names: a base identifier plus optional argument labels.

use smallvec::SmallVec;

use crate::{Identifier, Interner};

/// Argument labels of a compound name. Empty labels use `Identifier::EMPTY`.
pub type ArgumentLabels = SmallVec<[Identifier; 2]>;

/// The name a declaration is declared with, or the name a reference uses.
///
/// `foo` is a simple name; `foo(x:)` is a compound name with base `foo` and
/// one argument label `x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclName {
    base: Identifier,
    arguments: Option<ArgumentLabels>,
}

impl DeclName {
    pub fn simple(base: Identifier) -> Self {
        Self {
            base,
            arguments: None,
        }
    }

    pub fn compound(base: Identifier, arguments: impl IntoIterator<Item = Identifier>) -> Self {
        Self {
            base,
            arguments: Some(arguments.into_iter().collect()),
        }
    }

    pub fn base(&self) -> Identifier {
        self.base
    }

    pub fn is_simple(&self) -> bool {
        self.arguments.is_none()
    }

    pub fn arguments(&self) -> &[Identifier] {
        self.arguments.as_deref().unwrap_or(&[])
    }

    /// Whether a reference spelled `self` can refer to a declaration named
    /// `decl`. A simple reference matches every declaration with the same base;
    /// a compound reference matches only the identical compound name.
    pub fn matches_ref(&self, decl: &DeclName) -> bool {
        match &self.arguments {
            None => self.base == decl.base,
            Some(_) => self == decl,
        }
    }

    pub fn display(&self, interner: &Interner) -> String {
        let mut out = interner.resolve(self.base).to_string();
        if let Some(arguments) = &self.arguments {
            out.push('(');
            for label in arguments {
                if label.is_empty() {
                    out.push('_');
                } else {
                    out.push_str(interner.resolve(*label));
                }
                out.push(':');
            }
            out.push(')');
        }
        out
    }
}

impl From<Identifier> for DeclName {
    fn from(base: Identifier) -> Self {
        Self::simple(base)
    }
}
