//! Identity primitives shared by the module engine: interned identifiers,
//! spans, declaration names, access paths and arena handles.

mod access_path;
mod decl_name;
mod entities;
mod identifier;
mod intern;
mod span;

pub use access_path::{AccessPath, AccessPathElement};
pub use decl_name::{ArgumentLabels, DeclName};
pub use entities::{DeclId, ModuleId, TypeRef, UnitId};
pub use identifier::Identifier;
pub use intern::Interner;
pub use span::Span;
