//! The session arena.
//!
//! Every module of a build graph lives in one `ModuleContext`, together with
//! the interner and the declaration arena. Modules and units are addressed by
//! handle; a removed module leaves a tombstone so stale handles resolve to
//! `None` instead of to some other module.

use std::path::Path;

use modgraph_identity::{DeclId, Identifier, Interner, ModuleId, Span, UnitId};
use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};

use crate::decl::{Decl, DeclArena};
use crate::errors::ModuleError;
use crate::file_unit::{BuiltinUnit, FileUnit, FileUnitData, SourceFile};
use crate::import::ImportQueryKind;
use crate::module::{Module, ModuleOptions};

/// Session-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Name of the standard library module
    pub stdlib_name: String,
    /// Name of the module holding compiler builtins
    pub builtin_name: String,
    /// Nesting limit for conditional conformance checks
    pub max_conformance_depth: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            stdlib_name: "Std".to_string(),
            builtin_name: "Builtin".to_string(),
            max_conformance_depth: 32,
        }
    }
}

#[derive(Debug, Default)]
pub struct ModuleContext {
    interner: Interner,
    decls: DeclArena,
    modules: Vec<Option<Module>>,
    module_by_name: FxHashMap<Identifier, ModuleId>,
    unit_owner: FxHashMap<UnitId, ModuleId>,
    next_unit: u32,
    options: ContextOptions,
}

impl ModuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ContextOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut Interner {
        &mut self.interner
    }

    pub fn intern(&mut self, name: &str) -> Identifier {
        self.interner.intern(name)
    }

    pub fn decls(&self) -> &DeclArena {
        &self.decls
    }

    pub fn decls_mut(&mut self) -> &mut DeclArena {
        &mut self.decls
    }

    /// Borrow the declarations and a module at once, for module queries.
    pub fn module_and_decls(&self, id: ModuleId) -> Option<(&Module, &DeclArena)> {
        Some((self.module(id)?, &self.decls))
    }

    // ===== Modules =====

    /// Create an empty module. A later module with the same name shadows the
    /// earlier one in `module_named`.
    pub fn create_module(&mut self, name: &str, options: ModuleOptions) -> ModuleId {
        let id = ModuleId::new(self.modules.len() as u32);
        let ident = self.interner.intern(name);
        let module = Module::new(
            id,
            ident,
            name.to_string(),
            options,
            self.options.max_conformance_depth,
        );
        self.modules.push(Some(module));
        self.module_by_name.insert(ident, id);
        tracing::debug!(module = name, ?id, ?options, "module created");
        id
    }

    /// Create the builtin module with its single builtin unit.
    pub fn create_builtin_module(&mut self) -> ModuleId {
        let name = self.options.builtin_name.clone();
        let id = self.create_module(&name, ModuleOptions::new().with_system(true));
        let unit = BuiltinUnit::new(&mut self.interner, &mut self.decls);
        let unit_id = self.allocate_unit(id);
        for decl in unit.decls() {
            self.decls.set_owner(decl, unit_id);
        }
        if let Some(module) = self.module_mut(id) {
            module.add_file(FileUnit::new(unit_id, id, unit.into()));
        }
        id
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index() as usize)?.as_ref()
    }

    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id.index() as usize)?.as_mut()
    }

    pub fn try_module(&self, id: ModuleId) -> Result<&Module, ModuleError> {
        self.module(id).ok_or(ModuleError::UnknownModule(id))
    }

    pub fn try_module_mut(&mut self, id: ModuleId) -> Result<&mut Module, ModuleError> {
        self.module_mut(id).ok_or(ModuleError::UnknownModule(id))
    }

    pub fn module_named(&self, name: &str) -> Option<ModuleId> {
        let ident = self.interner.lookup(name)?;
        self.module_by_name.get(&ident).copied()
    }

    /// Live modules in creation order
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().flatten()
    }

    /// Destroy a module and its units. Edges pointing at it dangle.
    pub fn remove_module(&mut self, id: ModuleId) -> Result<Module, ModuleError> {
        let module = self
            .modules
            .get_mut(id.index() as usize)
            .and_then(Option::take)
            .ok_or(ModuleError::UnknownModule(id))?;
        for file in module.files() {
            self.unit_owner.remove(&file.id());
        }
        if self.module_by_name.get(&module.name()) == Some(&id) {
            self.module_by_name.remove(&module.name());
        }
        tracing::debug!(module = %module.name_str(), ?id, "module removed");
        Ok(module)
    }

    pub fn is_stdlib_module(&self, id: ModuleId) -> bool {
        self.module(id)
            .is_some_and(|m| m.name_str() == self.options.stdlib_name)
    }

    pub fn is_builtin_module(&self, id: ModuleId) -> bool {
        self.module(id)
            .is_some_and(|m| m.name_str() == self.options.builtin_name)
    }

    /// Dotted name through the foreign parent chain, e.g. `Outer.Inner`.
    pub fn full_module_name(&self, id: ModuleId) -> Option<String> {
        let mut names = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = Some(id);
        while let Some(next) = current {
            if !seen.insert(next) {
                tracing::warn!(module = ?id, "cycle in foreign parent chain");
                break;
            }
            let module = self.module(next)?;
            names.push(module.name());
            current = foreign_parent(module);
        }
        names.reverse();
        Some(self.interner.join(names, "."))
    }

    /// The native module overlaying a foreign one, if any.
    pub fn overlay_module(&self, id: ModuleId) -> Option<ModuleId> {
        self.module(id)?
            .files()
            .iter()
            .filter_map(FileUnit::as_loaded)
            .find_map(|f| f.overlay_module())
    }

    // ===== Units =====

    fn allocate_unit(&mut self, module: ModuleId) -> UnitId {
        let unit = UnitId::new(self.next_unit);
        self.next_unit += 1;
        self.unit_owner.insert(unit, module);
        unit
    }

    /// Add a unit to `module`, taking ownership of it. Its declarations are
    /// stamped with the new unit, and a source file gets its private
    /// discriminator.
    pub fn add_file(
        &mut self,
        module: ModuleId,
        data: impl Into<FileUnitData>,
    ) -> Result<UnitId, ModuleError> {
        let mut data = data.into();
        let target = self.try_module(module)?;
        if let FileUnitData::Source(source) = &mut data {
            let discriminator = private_discriminator(target, source.filename());
            tracing::trace!(file = %source.filename(), %discriminator, "private discriminator assigned");
            source.set_private_discriminator(discriminator);
        }

        let unit = self.allocate_unit(module);
        let file = FileUnit::new(unit, module, data);
        let mut owned = Vec::new();
        file.as_lookup().top_level_decls(&mut owned);
        file.as_lookup().local_type_decls(&mut owned);
        for decl in owned {
            self.decls.set_owner(decl, unit);
        }
        self.try_module_mut(module)?.add_file(file);
        Ok(unit)
    }

    pub fn remove_file(&mut self, unit: UnitId) -> Result<FileUnit, ModuleError> {
        let module = self.owning_module(unit).ok_or(ModuleError::UnknownUnit(unit))?;
        let file = self.try_module_mut(module)?.remove_file(unit)?;
        self.unit_owner.remove(&unit);
        Ok(file)
    }

    pub fn owning_module(&self, unit: UnitId) -> Option<ModuleId> {
        self.unit_owner.get(&unit).copied()
    }

    pub fn file(&self, unit: UnitId) -> Option<&FileUnit> {
        self.module(self.owning_module(unit)?)?.file(unit)
    }

    pub fn file_mut(&mut self, unit: UnitId) -> Option<&mut FileUnit> {
        let module = self.owning_module(unit)?;
        self.module_mut(module)?.file_mut(unit)
    }

    pub fn source_file(&self, unit: UnitId) -> Result<&SourceFile, ModuleError> {
        let file = self.file(unit).ok_or(ModuleError::UnknownUnit(unit))?;
        file.as_source().ok_or_else(|| ModuleError::NotASourceFile {
            unit,
            found: file.kind().to_string(),
        })
    }

    pub fn source_file_mut(&mut self, unit: UnitId) -> Result<&mut SourceFile, ModuleError> {
        let file = self.file_mut(unit).ok_or(ModuleError::UnknownUnit(unit))?;
        let found = file.kind();
        file.as_source_mut().ok_or_else(|| ModuleError::NotASourceFile {
            unit,
            found: found.to_string(),
        })
    }

    /// Allocate `decl` and append it to the source file `unit`. Lookup caches
    /// are left alone; call `invalidate_lookup_caches` after the batch.
    pub fn push_decl(&mut self, unit: UnitId, decl: Decl) -> Result<DeclId, ModuleError> {
        self.source_file(unit)?;
        let id = self.decls.alloc(decl);
        self.decls.set_owner(id, unit);
        self.source_file_mut(unit)?.add_decl(id);
        Ok(id)
    }

    /// Drop the lookup caches of `unit` and of its module.
    pub fn invalidate_lookup_caches(&mut self, unit: UnitId) -> Result<(), ModuleError> {
        let module = self
            .owning_module(unit)
            .ok_or(ModuleError::UnknownUnit(unit))?;
        let module = self.try_module_mut(module)?;
        if let Some(source) = module.file_mut(unit).and_then(FileUnit::as_source_mut) {
            source.clear_lookup_cache();
        }
        module.clear_lookup_cache();
        Ok(())
    }

    // ===== Entry points =====

    pub fn register_entry_point_file(
        &mut self,
        unit: UnitId,
        loc: Option<Span>,
    ) -> Result<(), ModuleError> {
        let module = self.owning_module(unit).ok_or(ModuleError::UnknownUnit(unit))?;
        self.try_module_mut(module)?
            .register_entry_point_file(unit, loc, None)
    }

    pub fn register_main_class(
        &mut self,
        unit: UnitId,
        class: DeclId,
        loc: Option<Span>,
    ) -> Result<(), ModuleError> {
        let module = self.owning_module(unit).ok_or(ModuleError::UnknownUnit(unit))?;
        let module = self
            .modules
            .get_mut(module.index() as usize)
            .and_then(Option::as_mut)
            .ok_or(ModuleError::UnknownModule(module))?;
        module.register_main_class(&self.decls, unit, class, loc)
    }

    // ===== Import checks =====

    /// Whether the source file `unit` has an import that exposes `decl` at
    /// its declared access level (a `@testable` or private import).
    pub fn has_testable_or_private_import(
        &self,
        unit: UnitId,
        decl: DeclId,
        query: ImportQueryKind,
    ) -> Result<bool, ModuleError> {
        let source = self.source_file(unit)?;
        let Some(owner) = self.decls.get(decl).owner else {
            return Ok(false);
        };
        let Some(decl_module) = self.owning_module(owner) else {
            return Ok(false);
        };
        let access = self.decls.get(decl).access;
        let private_filename = if access.is_file_scoped() {
            self.file(owner).and_then(|f| match (f.as_loaded(), f.as_source()) {
                (Some(loaded), _) => loaded.filename_for_private_decl(decl),
                (None, Some(source)) => Some(source.filename()),
                (None, None) => None,
            })
        } else {
            None
        };
        Ok(source.has_testable_or_private_import(
            access,
            decl_module,
            private_filename,
            query,
        ))
    }
}

fn foreign_parent(module: &Module) -> Option<ModuleId> {
    module
        .files()
        .iter()
        .filter_map(FileUnit::as_loaded)
        .filter_map(|f| f.foreign_info())
        .find_map(|info| info.parent)
}

/// `_` plus the upper-case hex SHA-256 of module name and file base name,
/// made unique within the module.
fn private_discriminator(module: &Module, filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename);
    let mut hasher = Sha256::new();
    hasher.update(module.name_str().as_bytes());
    hasher.update(base.as_bytes());
    let digest = hasher.finalize();
    let stem: String = std::iter::once("_".to_string())
        .chain(digest.iter().map(|byte| format!("{byte:02X}")))
        .collect();

    let taken: FxHashSet<&str> = module
        .files()
        .iter()
        .filter_map(FileUnit::as_source)
        .filter_map(SourceFile::private_discriminator)
        .collect();
    if !taken.contains(stem.as_str()) {
        return stem;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{stem}_{suffix}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        suffix += 1;
    }
}
