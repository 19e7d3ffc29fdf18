//! Derived name → declaration index.
//!
//! A `LookupCache` is never authoritative: it is rebuilt from the owner's
//! declaration list on demand and thrown away when the owner is told its
//! declarations changed. Between a mutation and the owner's invalidation the
//! cache may be stale.

use modgraph_identity::{AccessPath, DeclId, DeclName, Identifier};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::decl::{DeclArena, DeclKind, OperatorFixity};

/// Most names have exactly one declaration.
pub type DeclBucket = SmallVec<[DeclId; 1]>;

#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    /// Top-level value declarations keyed by base name
    top_level_values: FxHashMap<Identifier, DeclBucket>,
    /// Members of top-level classes, for dynamic member lookup
    class_members: FxHashMap<Identifier, DeclBucket>,
    operators: FxHashMap<(OperatorFixity, Identifier), DeclBucket>,
    precedence_groups: FxHashMap<Identifier, DeclBucket>,
    local_types: FxHashMap<String, DeclId>,
    selector_methods: FxHashMap<Identifier, DeclBucket>,
    /// Value declarations in the order they were indexed
    values_in_order: Vec<DeclId>,
    /// Top-level classes in the order they were indexed
    classes_in_order: Vec<DeclId>,
}

impl LookupCache {
    /// Index `top_level` declarations plus `local_types`.
    pub fn build(
        decls: &DeclArena,
        top_level: impl IntoIterator<Item = DeclId>,
        local_types: impl IntoIterator<Item = DeclId>,
    ) -> Self {
        let mut cache = Self::default();
        for id in top_level {
            cache.index_top_level(decls, id);
        }
        for id in local_types {
            if let Some(mangled) = &decls.get(id).local_mangled_name {
                cache.local_types.insert(mangled.clone(), id);
            }
        }
        tracing::trace!(
            values = cache.values_in_order.len(),
            classes = cache.classes_in_order.len(),
            operators = cache.operators.len(),
            "lookup cache built"
        );
        cache
    }

    fn index_top_level(&mut self, decls: &DeclArena, id: DeclId) {
        let decl = decls.get(id);
        if decl.kind.is_value() {
            self.top_level_values
                .entry(decl.base_name())
                .or_default()
                .push(id);
            self.values_in_order.push(id);
        }
        if let Some(fixity) = decl.kind.operator_fixity() {
            self.operators
                .entry((fixity, decl.base_name()))
                .or_default()
                .push(id);
        }
        match decl.kind {
            DeclKind::PrecedenceGroup => {
                self.precedence_groups
                    .entry(decl.base_name())
                    .or_default()
                    .push(id);
            }
            DeclKind::Class => {
                self.classes_in_order.push(id);
                for &member in &decl.members {
                    self.index_class_member(decls, member);
                }
            }
            DeclKind::Extension => {
                // Extension members are reachable through dynamic dispatch
                // but are not class members for AnyObject-style lookup.
                for &member in &decl.members {
                    self.index_selector(decls, member);
                }
            }
            _ => {}
        }
    }

    fn index_class_member(&mut self, decls: &DeclArena, member: DeclId) {
        let decl = decls.get(member);
        if decl.kind.is_value() {
            self.class_members
                .entry(decl.base_name())
                .or_default()
                .push(member);
        }
        self.index_selector(decls, member);
    }

    fn index_selector(&mut self, decls: &DeclArena, member: DeclId) {
        if let Some(selector) = decls.get(member).selector {
            self.selector_methods
                .entry(selector)
                .or_default()
                .push(member);
        }
    }

    /// Append every top-level value the reference `name` can refer to.
    pub fn lookup_value(&self, decls: &DeclArena, name: &DeclName, results: &mut Vec<DeclId>) {
        if let Some(bucket) = self.top_level_values.get(&name.base()) {
            results.extend(
                bucket
                    .iter()
                    .copied()
                    .filter(|&id| name.matches_ref(&decls.get(id).name)),
            );
        }
    }

    /// Visit every top-level value allowed by `access_path`.
    pub fn for_each_visible_value(&self, access_path: &AccessPath, mut f: impl FnMut(DeclId)) {
        match access_path.first() {
            None => self.values_in_order.iter().copied().for_each(&mut f),
            Some(name) => {
                if let Some(bucket) = self.top_level_values.get(&name) {
                    bucket.iter().copied().for_each(&mut f);
                }
            }
        }
    }

    /// Visit every member of the classes allowed by `access_path`.
    pub fn for_each_class_member(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        mut f: impl FnMut(DeclId),
    ) {
        for &class in &self.classes_in_order {
            let decl = decls.get(class);
            if access_path.first().is_some_and(|n| n != decl.base_name()) {
                continue;
            }
            decl.members
                .iter()
                .copied()
                .filter(|&m| decls.get(m).kind.is_value())
                .for_each(&mut f);
        }
    }

    pub fn lookup_class_member(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        name: &DeclName,
        results: &mut Vec<DeclId>,
    ) {
        if access_path.is_empty() {
            if let Some(bucket) = self.class_members.get(&name.base()) {
                results.extend(
                    bucket
                        .iter()
                        .copied()
                        .filter(|&id| name.matches_ref(&decls.get(id).name)),
                );
            }
            return;
        }
        self.for_each_class_member(decls, access_path, |member| {
            if name.matches_ref(&decls.get(member).name) {
                results.push(member);
            }
        });
    }

    /// The operator declared with `name` and `fixity`, if exactly one is.
    pub fn lookup_operator(&self, fixity: OperatorFixity, name: Identifier) -> Option<DeclId> {
        single(self.operators.get(&(fixity, name)))
    }

    pub fn lookup_precedence_group(&self, name: Identifier) -> Option<DeclId> {
        single(self.precedence_groups.get(&name))
    }

    pub fn precedence_groups(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.precedence_groups.values().flatten().copied()
    }

    pub fn lookup_local_type(&self, mangled: &str) -> Option<DeclId> {
        self.local_types.get(mangled).copied()
    }

    pub fn lookup_selector_methods(&self, selector: Identifier, results: &mut Vec<DeclId>) {
        if let Some(bucket) = self.selector_methods.get(&selector) {
            results.extend(bucket.iter().copied());
        }
    }
}

fn single(bucket: Option<&DeclBucket>) -> Option<DeclId> {
    match bucket.map(|b| b.as_slice()) {
        Some([only]) => Some(*only),
        _ => None,
    }
}
