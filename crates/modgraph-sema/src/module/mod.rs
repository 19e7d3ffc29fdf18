//! The compilation unit ("module"): an ordered set of units plus the
//! aggregate queries over them.
//!
//! Lookups here only consult the module's own units. Following imports is the
//! job of the traversal in `visible_modules`.
//!
//! Source files are answered from one module-wide lookup cache; builtin and
//! loaded units already carry their own indexes and are queried directly. The
//! module cache is dropped whenever the unit set changes, and must be dropped
//! by the caller (`clear_lookup_cache`) when a source file's declarations
//! change.

mod entry_point;
mod options;

pub use entry_point::{EntryPointCause, EntryPointInfo};
pub use options::{ModuleFlags, ModuleOptions, ResilienceStrategy};

use std::cell::OnceCell;
use std::fmt;

use modgraph_identity::{AccessPath, DeclId, DeclName, Identifier, ModuleId, TypeRef, UnitId};
use smallvec::SmallVec;

use crate::conformance::{self, ConformanceRef, ConformanceSolver};
use crate::debugger::DebuggerClient;
use crate::decl::{DeclArena, OperatorFixity};
use crate::errors::ModuleError;
use crate::file_unit::{FileUnit, FileUnitKind, SourceFile, SourceFileKind, UnitLookup};
use crate::import::{ImportFilter, ImportedModule, LinkLibrary};
use crate::lookup_cache::LookupCache;
use crate::walker::{DeclVisibility, DeclWalker, VisibleDeclConsumer};

/// How the caller is going to use a lookup's results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// Unqualified name in an expression or type
    Unqualified,
    /// Name written after a module qualifier (`M.name`)
    Qualified,
}

pub struct Module {
    id: ModuleId,
    name: Identifier,
    name_str: String,
    files: Vec<FileUnit>,
    cache: OnceCell<LookupCache>,
    flags: ModuleFlags,
    resilience: ResilienceStrategy,
    debug_client: Option<Box<dyn DebuggerClient>>,
    entry_point: EntryPointInfo,
    max_conformance_depth: usize,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("name", &self.name_str)
            .field("files", &self.files.len())
            .field("flags", &self.flags)
            .field("resilience", &self.resilience)
            .field("debug_client", &self.debug_client.is_some())
            .field("entry_point", &self.entry_point)
            .finish()
    }
}

impl Module {
    pub(crate) fn new(
        id: ModuleId,
        name: Identifier,
        name_str: String,
        options: ModuleOptions,
        max_conformance_depth: usize,
    ) -> Self {
        Self {
            id,
            name,
            name_str,
            files: Vec::new(),
            cache: OnceCell::new(),
            flags: options.flags(),
            resilience: options.resilience,
            debug_client: None,
            entry_point: EntryPointInfo::default(),
            max_conformance_depth,
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> Identifier {
        self.name
    }

    pub fn name_str(&self) -> &str {
        &self.name_str
    }

    // ===== Units =====

    /// Units in insertion order. The first is the main unit.
    pub fn files(&self) -> &[FileUnit] {
        &self.files
    }

    pub fn file(&self, unit: UnitId) -> Option<&FileUnit> {
        self.files.iter().find(|f| f.id() == unit)
    }

    pub fn file_mut(&mut self, unit: UnitId) -> Option<&mut FileUnit> {
        self.files.iter_mut().find(|f| f.id() == unit)
    }

    pub(crate) fn add_file(&mut self, file: FileUnit) {
        debug_assert_eq!(file.parent_module(), self.id);
        tracing::debug!(module = %self.name_str, unit = ?file.id(), kind = %file.kind(), "unit added");
        self.files.push(file);
        self.clear_lookup_cache();
    }

    pub(crate) fn remove_file(&mut self, unit: UnitId) -> Result<FileUnit, ModuleError> {
        let index = self
            .files
            .iter()
            .position(|f| f.id() == unit)
            .ok_or_else(|| self.unit_not_in_module(unit))?;
        let file = self.files.remove(index);
        self.entry_point.forget(unit);
        self.clear_lookup_cache();
        tracing::debug!(module = %self.name_str, ?unit, "unit removed");
        Ok(file)
    }

    /// Check the main unit's kind and return it.
    pub fn main_file(&self, kind: FileUnitKind) -> Result<&FileUnit, ModuleError> {
        let first = self.files.first().ok_or_else(|| ModuleError::NoFiles {
            module: self.name_str.clone(),
        })?;
        if first.kind() != kind {
            return Err(ModuleError::MainFileKindMismatch {
                module: self.name_str.clone(),
                expected: kind.to_string(),
                found: first.kind().to_string(),
            });
        }
        Ok(first)
    }

    /// The main unit as a source file of the given kind.
    pub fn main_source_file(&self, kind: SourceFileKind) -> Result<&SourceFile, ModuleError> {
        let file = self.main_file(FileUnitKind::Source)?;
        match file.as_source() {
            Some(source) if source.kind() == kind => Ok(source),
            Some(source) => Err(ModuleError::MainFileKindMismatch {
                module: self.name_str.clone(),
                expected: format!("{kind:?} source file"),
                found: format!("{:?} source file", source.kind()),
            }),
            None => Err(ModuleError::NoFiles {
                module: self.name_str.clone(),
            }),
        }
    }

    pub(crate) fn unit_not_in_module(&self, unit: UnitId) -> ModuleError {
        ModuleError::UnitNotInModule {
            module: self.name_str.clone(),
            unit,
        }
    }

    // ===== Flags =====

    pub fn flags(&self) -> ModuleFlags {
        self.flags
    }

    pub fn resilience_strategy(&self) -> ResilienceStrategy {
        self.resilience
    }

    pub fn set_resilience_strategy(&mut self, resilience: ResilienceStrategy) {
        self.resilience = resilience;
    }

    pub fn is_resilient(&self) -> bool {
        self.resilience == ResilienceStrategy::Resilient
    }

    pub fn is_testing_enabled(&self) -> bool {
        self.flags.contains(ModuleFlags::TESTING)
    }

    pub fn set_testing_enabled(&mut self, enabled: bool) {
        self.flags.set(ModuleFlags::TESTING, enabled);
    }

    pub fn is_implicit_dynamic_enabled(&self) -> bool {
        self.flags.contains(ModuleFlags::IMPLICIT_DYNAMIC)
    }

    pub fn set_implicit_dynamic_enabled(&mut self, enabled: bool) {
        self.flags.set(ModuleFlags::IMPLICIT_DYNAMIC, enabled);
    }

    pub fn are_private_imports_enabled(&self) -> bool {
        self.flags.contains(ModuleFlags::PRIVATE_IMPORTS)
    }

    pub fn set_private_imports_enabled(&mut self, enabled: bool) {
        self.flags.set(ModuleFlags::PRIVATE_IMPORTS, enabled);
    }

    pub fn failed_to_load(&self) -> bool {
        self.flags.contains(ModuleFlags::FAILED_TO_LOAD)
    }

    /// Sticky; there is no way back.
    pub fn set_failed_to_load(&mut self) {
        if !self.failed_to_load() {
            tracing::debug!(module = %self.name_str, "module marked as failed to load");
        }
        self.flags.insert(ModuleFlags::FAILED_TO_LOAD);
    }

    pub fn has_resolved_imports(&self) -> bool {
        self.flags.contains(ModuleFlags::RESOLVED_IMPORTS)
    }

    pub fn set_has_resolved_imports(&mut self) {
        self.flags.insert(ModuleFlags::RESOLVED_IMPORTS);
    }

    /// Declared system at creation, or made of system units.
    pub fn is_system_module(&self) -> bool {
        self.flags.contains(ModuleFlags::SYSTEM)
            || self
                .files
                .iter()
                .filter_map(FileUnit::as_loaded)
                .any(|f| f.is_system())
    }

    pub fn set_system_module(&mut self, system: bool) {
        self.flags.set(ModuleFlags::SYSTEM, system);
    }

    pub fn is_foreign_module(&self) -> bool {
        self.files
            .iter()
            .any(|f| f.kind() == FileUnitKind::ForeignModule)
    }

    /// Whether clients may look names up in this module directly. Implicit
    /// foreign submodules are only reachable through their parent.
    pub fn is_lookup_target(&self) -> bool {
        !self
            .files
            .iter()
            .filter_map(FileUnit::as_loaded)
            .filter_map(|f| f.foreign_info())
            .any(|info| info.is_implicit_submodule)
    }

    // ===== Lookup cache =====

    /// Drop the module-wide cache. Per-file caches are cleared separately.
    pub fn clear_lookup_cache(&mut self) {
        if self.cache.take().is_some() {
            tracing::trace!(module = %self.name_str, "module lookup cache cleared");
        }
    }

    fn lookup_cache(&self, decls: &DeclArena) -> &LookupCache {
        self.cache.get_or_init(|| {
            let sources = self.files.iter().filter_map(FileUnit::as_source);
            let mut local_types = Vec::new();
            for source in sources.clone() {
                source.local_type_decls(&mut local_types);
            }
            tracing::trace!(module = %self.name_str, "building module lookup cache");
            LookupCache::build(
                decls,
                sources.flat_map(|s| s.decls().iter().copied()),
                local_types,
            )
        })
    }

    /// Units queried directly rather than through the module cache
    fn indexed_units(&self) -> impl Iterator<Item = &FileUnit> {
        self.files.iter().filter(|f| f.as_source().is_none())
    }

    // ===== Lookup =====

    /// Top-level values named `name` in this module's own units. An access
    /// path restricts the result to that single name.
    pub fn lookup_value(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        name: &DeclName,
        kind: LookupKind,
        results: &mut Vec<DeclId>,
    ) {
        debug_assert!(access_path.len() <= 1, "only single-level qualification");
        if self.failed_to_load() {
            return;
        }
        let start = results.len();
        if access_path.matches(name) {
            self.lookup_cache(decls).lookup_value(decls, name, results);
        }
        for file in self.indexed_units() {
            file.as_lookup()
                .lookup_value(decls, access_path, name, kind, results);
        }
        if let Some(client) = &self.debug_client {
            let mut found = results.split_off(start);
            client.finish_lookup_in_module(self.id, name, kind, &mut found);
            results.append(&mut found);
        }
        tracing::trace!(
            module = %self.name_str,
            ?kind,
            found = results.len() - start,
            "module value lookup"
        );
    }

    pub fn lookup_visible_decls(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
        kind: LookupKind,
    ) {
        if self.failed_to_load() {
            return;
        }
        self.lookup_cache(decls)
            .for_each_visible_value(access_path, |d| consumer.found_decl(d, DeclVisibility::TopLevel));
        for file in self.indexed_units() {
            file.as_lookup()
                .lookup_visible_decls(decls, access_path, consumer, kind);
        }
    }

    pub fn lookup_class_members(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
    ) {
        if self.failed_to_load() {
            return;
        }
        self.lookup_cache(decls)
            .for_each_class_member(decls, access_path, |d| {
                consumer.found_decl(d, DeclVisibility::DynamicLookup)
            });
        for file in self.indexed_units() {
            file.as_lookup()
                .lookup_class_members(decls, access_path, consumer);
        }
    }

    pub fn lookup_class_member(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        name: &DeclName,
        results: &mut Vec<DeclId>,
    ) {
        if self.failed_to_load() {
            return;
        }
        self.lookup_cache(decls)
            .lookup_class_member(decls, access_path, name, results);
        for file in self.indexed_units() {
            file.as_lookup()
                .lookup_class_member(decls, access_path, name, results);
        }
    }

    /// Members of `container` named `name`. With a discriminator, only
    /// private members from the file that discriminator identifies.
    pub fn lookup_member(
        &self,
        decls: &DeclArena,
        container: DeclId,
        name: &DeclName,
        private_discriminator: Option<&str>,
        results: &mut Vec<DeclId>,
    ) {
        if self.failed_to_load() {
            return;
        }
        let members = decls
            .get(container)
            .members
            .iter()
            .copied()
            .filter(|&m| name.matches_ref(&decls.get(m).name));
        let Some(discriminator) = private_discriminator else {
            results.extend(members);
            return;
        };
        results.extend(members.filter(|&m| {
            let member = decls.get(m);
            member.access.is_file_scoped()
                && member
                    .owner
                    .and_then(|unit| self.file(unit))
                    .and_then(|f| f.as_lookup().discriminator_for_private_value(decls, m))
                    == Some(discriminator)
        }));
    }

    pub fn lookup_selector_methods(
        &self,
        decls: &DeclArena,
        selector: Identifier,
        results: &mut Vec<DeclId>,
    ) {
        if self.failed_to_load() {
            return;
        }
        for file in &self.files {
            file.as_lookup()
                .lookup_selector_methods(decls, selector, results);
        }
    }

    pub fn lookup_local_type(&self, decls: &DeclArena, mangled: &str) -> Option<DeclId> {
        if self.failed_to_load() {
            return None;
        }
        self.lookup_cache(decls)
            .lookup_local_type(mangled)
            .or_else(|| {
                self.indexed_units()
                    .find_map(|f| f.as_lookup().lookup_local_type(decls, mangled))
            })
    }

    /// The operator declared as `name` with `fixity`, or `None` when it is
    /// missing or declared differently by more than one unit.
    pub fn lookup_operator(
        &self,
        decls: &DeclArena,
        fixity: OperatorFixity,
        name: Identifier,
    ) -> Option<DeclId> {
        self.unique_across_files("operator", |file| {
            file.as_lookup().lookup_operator(decls, fixity, name)
        })
    }

    pub fn lookup_precedence_group(&self, decls: &DeclArena, name: Identifier) -> Option<DeclId> {
        self.unique_across_files("precedence group", |file| {
            file.as_lookup().lookup_precedence_group(decls, name)
        })
    }

    fn unique_across_files(
        &self,
        what: &str,
        mut lookup: impl FnMut(&FileUnit) -> Option<DeclId>,
    ) -> Option<DeclId> {
        if self.failed_to_load() {
            return None;
        }
        let mut found: SmallVec<[DeclId; 2]> = SmallVec::new();
        for file in &self.files {
            if let Some(decl) = lookup(file)
                && !found.contains(&decl)
            {
                found.push(decl);
            }
        }
        match found.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => {
                tracing::warn!(module = %self.name_str, what, candidates = found.len(), "ambiguous lookup");
                None
            }
        }
    }

    // ===== Enumeration =====

    pub fn top_level_decls(&self, results: &mut Vec<DeclId>) {
        if self.failed_to_load() {
            return;
        }
        for file in &self.files {
            file.as_lookup().top_level_decls(results);
        }
    }

    pub fn local_type_decls(&self, results: &mut Vec<DeclId>) {
        if self.failed_to_load() {
            return;
        }
        for file in &self.files {
            file.as_lookup().local_type_decls(results);
        }
    }

    pub fn precedence_groups(&self, decls: &DeclArena, results: &mut Vec<DeclId>) {
        if self.failed_to_load() {
            return;
        }
        for file in &self.files {
            file.as_lookup().precedence_groups(decls, results);
        }
    }

    pub fn display_decls(&self, results: &mut Vec<DeclId>) {
        if self.failed_to_load() {
            return;
        }
        for file in &self.files {
            file.as_lookup().display_decls(results);
        }
    }

    /// Walk every unit's declarations. Returns true if the walker aborted.
    pub fn walk(&self, decls: &DeclArena, walker: &mut dyn DeclWalker) -> bool {
        if self.failed_to_load() {
            return false;
        }
        self.files
            .iter()
            .any(|file| file.as_lookup().walk(decls, walker))
    }

    // ===== Imports =====

    /// Union of the units' import edges in the categories `filter` selects.
    pub fn imported_modules(&self, imports: &mut Vec<ImportedModule>, filter: ImportFilter) {
        if !self.import_edges_available() {
            return;
        }
        for file in &self.files {
            file.as_lookup().imported_modules(imports, filter);
        }
    }

    pub fn imported_modules_for_lookup(&self, imports: &mut Vec<ImportedModule>) {
        if !self.import_edges_available() {
            return;
        }
        for file in &self.files {
            file.as_lookup().imported_modules_for_lookup(imports);
        }
    }

    /// Libraries this module's own units ask the linker for.
    pub fn collect_link_libraries(&self, callback: &mut dyn FnMut(&LinkLibrary)) {
        if !self.import_edges_available() {
            return;
        }
        for file in &self.files {
            file.as_lookup().collect_link_libraries(callback);
        }
    }

    /// False for failed modules. Source imports read before name binding
    /// marked them resolved are still answered, with a warning.
    fn import_edges_available(&self) -> bool {
        if self.failed_to_load() {
            return false;
        }
        if !self.has_resolved_imports() && self.files.iter().any(|f| f.as_source().is_some()) {
            tracing::warn!(module = %self.name_str, "trusting imports that are not resolved yet");
        }
        true
    }

    // ===== Debugger =====

    pub fn debug_client(&self) -> Option<&dyn DebuggerClient> {
        self.debug_client.as_deref()
    }

    /// Attach a debugger client. Only one may ever be attached.
    pub fn set_debug_client(&mut self, client: Box<dyn DebuggerClient>) -> Result<(), ModuleError> {
        if self.debug_client.is_some() {
            return Err(ModuleError::DebugClientAlreadySet {
                module: self.name_str.clone(),
            });
        }
        self.debug_client = Some(client);
        Ok(())
    }

    // ===== Conformance =====

    /// Ask `solver` whether `ty` conforms to `protocol` as seen from this
    /// module, with every conditional requirement satisfied.
    pub fn conforms_to_protocol(
        &self,
        solver: &dyn ConformanceSolver,
        ty: TypeRef,
        protocol: DeclId,
    ) -> Option<ConformanceRef> {
        conformance::conforms_to_protocol(solver, self.id, ty, protocol, self.max_conformance_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{AccessLevel, Decl, DeclKind};
    use crate::file_unit::{FileUnitData, LoadedFile, LoadedFileKind};
    use crate::import::{ImportOptions, ImportedModuleDesc, LibraryKind};
    use modgraph_identity::{Interner, Span};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Fixture {
        interner: Interner,
        decls: DeclArena,
        module: Module,
        next_unit: u32,
    }

    impl Fixture {
        fn new() -> Self {
            let mut interner = Interner::new();
            let name = interner.intern("M");
            Self {
                interner,
                decls: DeclArena::new(),
                module: Module::new(ModuleId::new(0), name, "M".into(), ModuleOptions::new(), 8),
                next_unit: 0,
            }
        }

        fn decl(&mut self, name: &str, kind: DeclKind) -> DeclId {
            let name = self.interner.intern(name);
            self.decls.alloc(Decl::new(name, kind))
        }

        fn add(&mut self, data: impl Into<FileUnitData>) -> UnitId {
            let unit = UnitId::new(self.next_unit);
            self.next_unit += 1;
            self.module
                .add_file(FileUnit::new(unit, self.module.id(), data.into()));
            unit
        }

        fn lookup(&self, name: &str) -> Vec<DeclId> {
            let mut results = Vec::new();
            let name = self.interner.lookup(name).unwrap();
            self.module.lookup_value(
                &self.decls,
                &AccessPath::empty(),
                &DeclName::simple(name),
                LookupKind::Unqualified,
                &mut results,
            );
            results
        }
    }

    #[test]
    fn values_from_sources_and_loaded_units() {
        let mut fx = Fixture::new();
        let a = fx.decl("a", DeclKind::Func);
        let b = fx.decl("a", DeclKind::Var);
        fx.add(SourceFile::new(SourceFileKind::Library, "a.src").with_decls([a]));
        let loaded = LoadedFile::builder(LoadedFileKind::SerializedAst, "b.mod")
            .decls([b])
            .build(&fx.decls);
        fx.add(loaded);

        let mut found = fx.lookup("a");
        found.sort();
        assert_eq!(found, vec![a, b]);
    }

    #[test]
    fn failed_modules_answer_nothing() {
        let mut fx = Fixture::new();
        let a = fx.decl("a", DeclKind::Func);
        fx.add(SourceFile::new(SourceFileKind::Library, "a.src").with_decls([a]));
        fx.module.set_failed_to_load();
        assert!(fx.lookup("a").is_empty());
        assert!(fx.module.failed_to_load());
    }

    #[derive(Default)]
    struct CountingWalker {
        seen: usize,
    }

    impl DeclWalker for CountingWalker {
        fn walk_to_decl_pre(&mut self, _id: DeclId, _decl: &Decl) -> bool {
            self.seen += 1;
            true
        }
    }

    #[test]
    fn failed_modules_enumerate_nothing() {
        let mut fx = Fixture::new();
        let a = fx.decl("a", DeclKind::Func);
        let loaded = LoadedFile::builder(LoadedFileKind::SerializedAst, "dep.mod")
            .decls([a])
            .import(ImportedModule::whole(ModuleId::new(1)), ImportFilter::PUBLIC)
            .link_library(LinkLibrary::new("dep", LibraryKind::Library))
            .build(&fx.decls);
        fx.add(loaded);

        let mut top = Vec::new();
        fx.module.top_level_decls(&mut top);
        assert_eq!(top, vec![a]);

        fx.module.set_failed_to_load();
        top.clear();
        fx.module.top_level_decls(&mut top);
        fx.module.display_decls(&mut top);
        assert!(top.is_empty());

        let mut edges = Vec::new();
        fx.module.imported_modules(&mut edges, ImportFilter::all());
        fx.module.imported_modules_for_lookup(&mut edges);
        assert!(edges.is_empty());

        let mut libraries = 0;
        fx.module
            .collect_link_libraries(&mut |_: &LinkLibrary| libraries += 1);
        assert_eq!(libraries, 0);

        let mut walker = CountingWalker::default();
        assert!(!fx.module.walk(&fx.decls, &mut walker));
        assert_eq!(walker.seen, 0);
    }

    #[test]
    fn unresolved_imports_are_still_answered() {
        let mut fx = Fixture::new();
        let mut source = SourceFile::new(SourceFileKind::Library, "a.src");
        source.add_imports([ImportedModuleDesc::new(
            ImportedModule::whole(ModuleId::new(1)),
            ImportOptions::EXPORTED,
        )
        .unwrap()]);
        fx.add(source);
        assert!(!fx.module.has_resolved_imports());

        let mut edges = Vec::new();
        fx.module.imported_modules_for_lookup(&mut edges);
        assert_eq!(edges, vec![ImportedModule::whole(ModuleId::new(1))]);

        fx.module.set_has_resolved_imports();
        edges.clear();
        fx.module.imported_modules_for_lookup(&mut edges);
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn visible_decls_stream_every_unit_without_dedup() {
        let mut fx = Fixture::new();
        let from_source = fx.decl("shared", DeclKind::Func);
        let from_loaded = fx.decl("shared", DeclKind::Func);
        fx.add(SourceFile::new(SourceFileKind::Library, "a.src").with_decls([from_source]));
        let loaded = LoadedFile::builder(LoadedFileKind::SerializedAst, "b.mod")
            .decls([from_loaded])
            .build(&fx.decls);
        fx.add(loaded);

        let mut seen = Vec::new();
        fx.module.lookup_visible_decls(
            &fx.decls,
            &AccessPath::empty(),
            &mut |d: DeclId, v: DeclVisibility| seen.push((d, v)),
            LookupKind::Unqualified,
        );
        assert_eq!(
            seen,
            vec![
                (from_source, DeclVisibility::TopLevel),
                (from_loaded, DeclVisibility::TopLevel),
            ]
        );

        let mut shown = Vec::new();
        fx.module.display_decls(&mut shown);
        assert_eq!(shown, vec![from_source, from_loaded]);
    }

    #[test]
    fn class_lookups_merge_sources_and_loaded_units() {
        let mut fx = Fixture::new();
        let selector = fx.interner.intern("run:");
        let run = fx.interner.intern("run");
        let local_run = fx
            .decls
            .alloc(Decl::new(run, DeclKind::Func).with_selector(selector));
        let loaded_run = fx
            .decls
            .alloc(Decl::new(run, DeclKind::Func).with_selector(selector));
        let app_name = fx.interner.intern("App");
        let app = fx
            .decls
            .alloc(Decl::new(app_name, DeclKind::Class).with_members([local_run]));
        let tool_name = fx.interner.intern("Tool");
        let tool = fx
            .decls
            .alloc(Decl::new(tool_name, DeclKind::Class).with_members([loaded_run]));
        let inner = fx.interner.intern("Inner");
        let local_inner = fx
            .decls
            .alloc(Decl::new(inner, DeclKind::Struct).with_local_mangled_name("$s3App5InnerL_V"));
        let loaded_inner = fx
            .decls
            .alloc(Decl::new(inner, DeclKind::Struct).with_local_mangled_name("$s4Tool5InnerL_V"));

        let mut source = SourceFile::new(SourceFileKind::Library, "app.src").with_decls([app]);
        source.add_local_type_decl(local_inner);
        fx.add(source);
        let loaded = LoadedFile::builder(LoadedFileKind::SerializedAst, "tool.mod")
            .decls([tool])
            .local_types([loaded_inner])
            .build(&fx.decls);
        fx.add(loaded);

        let mut seen = Vec::new();
        fx.module.lookup_class_members(
            &fx.decls,
            &AccessPath::empty(),
            &mut |d: DeclId, _: DeclVisibility| seen.push(d),
        );
        assert_eq!(seen, vec![local_run, loaded_run]);

        seen.clear();
        fx.module.lookup_class_members(
            &fx.decls,
            &AccessPath::single(tool_name, Span::default()),
            &mut |d: DeclId, _: DeclVisibility| seen.push(d),
        );
        assert_eq!(seen, vec![loaded_run]);

        let mut results = Vec::new();
        fx.module.lookup_class_member(
            &fx.decls,
            &AccessPath::empty(),
            &DeclName::simple(run),
            &mut results,
        );
        assert_eq!(results, vec![local_run, loaded_run]);

        results.clear();
        fx.module
            .lookup_selector_methods(&fx.decls, selector, &mut results);
        assert_eq!(results, vec![local_run, loaded_run]);

        assert_eq!(
            fx.module.lookup_local_type(&fx.decls, "$s3App5InnerL_V"),
            Some(local_inner)
        );
        assert_eq!(
            fx.module.lookup_local_type(&fx.decls, "$s4Tool5InnerL_V"),
            Some(loaded_inner)
        );
        assert_eq!(fx.module.lookup_local_type(&fx.decls, "$s5Other5InnerL_V"), None);
    }

    #[test]
    fn removing_a_unit_invalidates_the_cache() {
        let mut fx = Fixture::new();
        let a = fx.decl("a", DeclKind::Func);
        let unit = fx.add(SourceFile::new(SourceFileKind::Library, "a.src").with_decls([a]));
        assert_eq!(fx.lookup("a"), vec![a]);

        fx.module.remove_file(unit).unwrap();
        assert!(fx.lookup("a").is_empty());
        assert!(matches!(
            fx.module.remove_file(unit),
            Err(ModuleError::UnitNotInModule { .. })
        ));
    }

    #[test]
    fn operator_conflict_across_files_is_absent() {
        let mut fx = Fixture::new();
        let first = fx.decl("<>", DeclKind::InfixOperator);
        let second = fx.decl("<>", DeclKind::InfixOperator);
        let prefix = fx.decl("<>", DeclKind::PrefixOperator);
        fx.add(SourceFile::new(SourceFileKind::Library, "a.src").with_decls([first, prefix]));
        let name = fx.interner.lookup("<>").unwrap();
        assert_eq!(
            fx.module.lookup_operator(&fx.decls, OperatorFixity::Infix, name),
            Some(first)
        );

        let loaded = LoadedFile::builder(LoadedFileKind::SerializedAst, "b.mod")
            .decls([second])
            .build(&fx.decls);
        fx.add(loaded);
        assert_eq!(fx.module.lookup_operator(&fx.decls, OperatorFixity::Infix, name), None);
        assert_eq!(
            fx.module.lookup_operator(&fx.decls, OperatorFixity::Prefix, name),
            Some(prefix)
        );
    }

    #[test]
    fn main_file_accessors() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.module.main_file(FileUnitKind::Source),
            Err(ModuleError::NoFiles { .. })
        ));
        fx.add(SourceFile::new(SourceFileKind::Main, "main.src"));
        assert!(fx.module.main_file(FileUnitKind::Source).is_ok());
        assert!(fx.module.main_source_file(SourceFileKind::Main).is_ok());
        assert!(matches!(
            fx.module.main_source_file(SourceFileKind::Library),
            Err(ModuleError::MainFileKindMismatch { .. })
        ));
        assert!(matches!(
            fx.module.main_file(FileUnitKind::SerializedAst),
            Err(ModuleError::MainFileKindMismatch { .. })
        ));
    }

    #[derive(Default)]
    struct HidingClient {
        calls: Rc<RefCell<Vec<LookupKind>>>,
    }

    impl DebuggerClient for HidingClient {
        fn finish_lookup_in_module(
            &self,
            _module: ModuleId,
            _name: &DeclName,
            kind: LookupKind,
            results: &mut Vec<DeclId>,
        ) {
            self.calls.borrow_mut().push(kind);
            results.clear();
        }
    }

    #[test]
    fn debug_client_is_set_once_and_filters_results() {
        let mut fx = Fixture::new();
        let a = fx.decl("a", DeclKind::Func);
        fx.add(SourceFile::new(SourceFileKind::Library, "a.src").with_decls([a]));

        let client = HidingClient::default();
        let calls = client.calls.clone();
        fx.module.set_debug_client(Box::new(client)).unwrap();
        assert!(matches!(
            fx.module.set_debug_client(Box::new(HidingClient::default())),
            Err(ModuleError::DebugClientAlreadySet { .. })
        ));

        assert!(fx.lookup("a").is_empty());
        assert_eq!(*calls.borrow(), vec![LookupKind::Unqualified]);
    }

    #[test]
    fn private_members_by_discriminator() {
        let mut fx = Fixture::new();
        let open_member = fx.decl("helper", DeclKind::Func);
        let hidden_name = fx.interner.intern("helper");
        let hidden = fx
            .decls
            .alloc(Decl::new(hidden_name, DeclKind::Func).with_access(AccessLevel::Private));
        let container_name = fx.interner.intern("Box");
        let container = fx.decls.alloc(
            Decl::new(container_name, DeclKind::Struct).with_members([open_member, hidden]),
        );

        let mut source = SourceFile::new(SourceFileKind::Library, "box.src").with_decls([container]);
        source.set_private_discriminator("_D1".into());
        let unit = fx.add(source);
        fx.decls.set_owner(container, unit);

        let name = DeclName::simple(hidden_name);
        let mut results = Vec::new();
        fx.module
            .lookup_member(&fx.decls, container, &name, None, &mut results);
        assert_eq!(results, vec![open_member, hidden]);

        results.clear();
        fx.module
            .lookup_member(&fx.decls, container, &name, Some("_D1"), &mut results);
        assert_eq!(results, vec![hidden]);

        results.clear();
        fx.module
            .lookup_member(&fx.decls, container, &name, Some("_D2"), &mut results);
        assert!(results.is_empty());
    }
}
