// file_unit/builtin.rs
//
// The compiler-provided unit of the Builtin module. Its declarations are
// created up front from fixed tables and resolved by exact name.

use modgraph_identity::{AccessPath, DeclId, DeclName, Identifier, Interner};
use rustc_hash::FxHashMap;

use super::UnitLookup;
use crate::decl::{AccessLevel, Decl, DeclArena, DeclKind};
use crate::module::LookupKind;

const BUILTIN_TYPES: &[&str] = &[
    "Int1",
    "Int8",
    "Int16",
    "Int32",
    "Int64",
    "Int128",
    "Word",
    "FPIEEE32",
    "FPIEEE64",
    "RawPointer",
    "NativeObject",
    "BridgeObject",
    "UnknownObject",
];

const BUILTIN_FUNCTIONS: &[&str] = &[
    "sizeof",
    "strideof",
    "alignof",
    "unreachable",
    "int_trap",
    "condfail",
];

#[derive(Debug)]
pub struct BuiltinUnit {
    by_name: FxHashMap<Identifier, DeclId>,
}

impl BuiltinUnit {
    pub fn new(interner: &mut Interner, decls: &mut DeclArena) -> Self {
        let tables = [
            (BUILTIN_TYPES, DeclKind::TypeAlias),
            (BUILTIN_FUNCTIONS, DeclKind::Func),
        ];
        let mut by_name = FxHashMap::default();
        for (names, kind) in tables {
            for name in names {
                let name = interner.intern(name);
                let id = decls.alloc(Decl::new(name, kind).with_access(AccessLevel::Public));
                by_name.insert(name, id);
            }
        }
        tracing::debug!(decls = by_name.len(), "builtin unit created");
        Self { by_name }
    }

    /// Every builtin declaration, in no particular order
    pub fn decls(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.by_name.values().copied()
    }

    pub fn lookup(&self, name: Identifier) -> Option<DeclId> {
        self.by_name.get(&name).copied()
    }
}

impl UnitLookup for BuiltinUnit {
    fn lookup_value(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        name: &DeclName,
        _kind: LookupKind,
        results: &mut Vec<DeclId>,
    ) {
        if !access_path.matches(name) {
            return;
        }
        if let Some(id) = self.lookup(name.base())
            && name.matches_ref(&decls.get(id).name)
        {
            results.push(id);
        }
    }

    fn lookup_selector_methods(
        &self,
        _decls: &DeclArena,
        _selector: Identifier,
        _results: &mut Vec<DeclId>,
    ) {
    }

    fn discriminator_for_private_value(&self, _decls: &DeclArena, _decl: DeclId) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_fixed_names_only() {
        let mut interner = Interner::new();
        let mut decls = DeclArena::new();
        let unit = BuiltinUnit::new(&mut interner, &mut decls);

        let mut results = Vec::new();
        let int64 = interner.intern("Int64");
        unit.lookup_value(
            &decls,
            &AccessPath::empty(),
            &DeclName::simple(int64),
            LookupKind::Qualified,
            &mut results,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(decls.get(results[0]).kind, DeclKind::TypeAlias);
        assert_eq!(decls.get(results[0]).access, AccessLevel::Public);

        results.clear();
        let missing = interner.intern("Float80");
        unit.lookup_value(
            &decls,
            &AccessPath::empty(),
            &DeclName::simple(missing),
            LookupKind::Qualified,
            &mut results,
        );
        assert!(results.is_empty());
    }

    #[test]
    fn browsing_shows_nothing() {
        let mut interner = Interner::new();
        let mut decls = DeclArena::new();
        let unit = BuiltinUnit::new(&mut interner, &mut decls);

        let mut top = Vec::new();
        unit.top_level_decls(&mut top);
        assert!(top.is_empty());
        assert_eq!(unit.decls().count(), BUILTIN_TYPES.len() + BUILTIN_FUNCTIONS.len());
        assert!(!unit.has_entry_point());
    }
}
