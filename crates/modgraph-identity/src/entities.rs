//! Arena handles for the entities the module engine tracks.
//!
//! Handles are plain indices; a handle whose slot has been removed resolves
//! to `None` instead of dangling.

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(u32);

        impl $name {
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            pub const fn index(self) -> u32 {
                self.0
            }
        }
    };
}

define_entity_id! {
    /// Identity for a compilation unit (module) inside a `ModuleContext`
    pub struct ModuleId;
}

define_entity_id! {
    /// Identity for a source unit (parsed file, builtin unit, loaded file)
    pub struct UnitId;
}

define_entity_id! {
    /// Identity for a declaration in the session's declaration arena
    pub struct DeclId;
}

define_entity_id! {
    /// Opaque type handle owned by the external type checker
    pub struct TypeRef;
}
