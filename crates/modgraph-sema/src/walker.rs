// walker.rs
//
// Callback interfaces used by the push-style lookups and by `walk`.

use modgraph_identity::DeclId;

use crate::decl::{Decl, DeclArena};

/// Why a declaration was reported to a `VisibleDeclConsumer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclVisibility {
    /// Visible as a top-level declaration of a module
    TopLevel,
    /// Visible only through dynamic member lookup on a class instance
    DynamicLookup,
}

/// Receives declarations from `lookup_visible_decls`/`lookup_class_members`.
///
/// Called once per declaration found; there is no ordering guarantee and no
/// duplicate suppression across units.
pub trait VisibleDeclConsumer {
    fn found_decl(&mut self, decl: DeclId, visibility: DeclVisibility);
}

impl<F> VisibleDeclConsumer for F
where
    F: FnMut(DeclId, DeclVisibility),
{
    fn found_decl(&mut self, decl: DeclId, visibility: DeclVisibility) {
        self(decl, visibility)
    }
}

/// Pre/post-order visitor over declarations.
pub trait DeclWalker {
    /// Return false to skip the declaration's members.
    fn walk_to_decl_pre(&mut self, _id: DeclId, _decl: &Decl) -> bool {
        true
    }

    /// Return false to abort the whole walk.
    fn walk_to_decl_post(&mut self, _id: DeclId, _decl: &Decl) -> bool {
        true
    }
}

/// Walk `roots` and their members. Returns true if the walker aborted.
pub(crate) fn walk_decls(
    decls: &DeclArena,
    roots: impl IntoIterator<Item = DeclId>,
    walker: &mut dyn DeclWalker,
) -> bool {
    roots
        .into_iter()
        .any(|root| walk_decl(decls, root, walker))
}

fn walk_decl(decls: &DeclArena, id: DeclId, walker: &mut dyn DeclWalker) -> bool {
    let decl = decls.get(id);
    if walker.walk_to_decl_pre(id, decl) {
        for &member in &decl.members {
            if walk_decl(decls, member, walker) {
                return true;
            }
        }
    }
    !walker.walk_to_decl_post(id, decl)
}
