// file_unit/loaded.rs
//
// Units deserialized or imported from outside the current compilation:
// serialized modules, foreign (C-family) modules, and debug-info modules.
// Their content is fixed once built, so the name index is built eagerly.

use modgraph_identity::{AccessPath, DeclId, DeclName, Identifier, ModuleId};
use rustc_hash::FxHashMap;

use super::{FileUnitKind, UnitLookup};
use crate::decl::{DeclArena, OperatorFixity};
use crate::errors::ModuleError;
use crate::import::{ImportFilter, ImportedModule, LinkLibrary};
use crate::lookup_cache::LookupCache;
use crate::module::LookupKind;
use crate::walker::{DeclVisibility, VisibleDeclConsumer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadedFileKind {
    SerializedAst,
    ForeignModule,
    DebugInfoModule,
}

impl From<LoadedFileKind> for FileUnitKind {
    fn from(kind: LoadedFileKind) -> Self {
        match kind {
            LoadedFileKind::SerializedAst => FileUnitKind::SerializedAst,
            LoadedFileKind::ForeignModule => FileUnitKind::ForeignModule,
            LoadedFileKind::DebugInfoModule => FileUnitKind::DebugInfoModule,
        }
    }
}

/// Extra facts about a foreign module's place in its own module hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForeignModuleInfo {
    /// Enclosing module for submodules (`Outer.Inner`)
    pub parent: Option<ModuleId>,
    /// Submodule that is only reachable through its parent and is never a
    /// lookup target on its own
    pub is_implicit_submodule: bool,
}

#[derive(Debug)]
pub struct LoadedFile {
    kind: LoadedFileKind,
    filename: String,
    top_level: Vec<DeclId>,
    local_types: Vec<DeclId>,
    index: LookupCache,
    imports: Vec<(ImportedModule, ImportFilter)>,
    /// Original file of each private declaration, recorded while loading
    private_filenames: FxHashMap<DeclId, String>,
    private_discriminators: FxHashMap<DeclId, String>,
    overlay: Option<ModuleId>,
    is_system: bool,
    link_libraries: Vec<LinkLibrary>,
    main_class: Option<DeclId>,
    foreign: Option<ForeignModuleInfo>,
}

impl LoadedFile {
    pub fn builder(kind: LoadedFileKind, filename: impl Into<String>) -> LoadedFileBuilder {
        LoadedFileBuilder::new(kind, filename)
    }

    pub fn kind(&self) -> LoadedFileKind {
        self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// The module this one overlays, for foreign modules with a native
    /// companion module
    pub fn overlay_module(&self) -> Option<ModuleId> {
        self.overlay
    }

    pub fn foreign_info(&self) -> Option<&ForeignModuleInfo> {
        self.foreign.as_ref()
    }

    pub fn link_libraries(&self) -> &[LinkLibrary] {
        &self.link_libraries
    }

    /// Remember which source file a private declaration came from. A
    /// declaration belongs to exactly one file, so a different name is
    /// rejected.
    pub fn add_filename_for_private_decl(
        &mut self,
        decl: DeclId,
        filename: impl Into<String>,
    ) -> Result<(), ModuleError> {
        let filename = filename.into();
        match self.private_filenames.get(&decl) {
            Some(existing) if *existing != filename => Err(ModuleError::ConflictingPrivateFilename {
                existing: existing.clone(),
                requested: filename,
            }),
            Some(_) => Ok(()),
            None => {
                self.private_filenames.insert(decl, filename);
                Ok(())
            }
        }
    }

    pub fn filename_for_private_decl(&self, decl: DeclId) -> Option<&str> {
        self.private_filenames.get(&decl).map(String::as_str)
    }
}

impl UnitLookup for LoadedFile {
    fn lookup_value(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        name: &DeclName,
        _kind: LookupKind,
        results: &mut Vec<DeclId>,
    ) {
        if access_path.matches(name) {
            self.index.lookup_value(decls, name, results);
        }
    }

    fn lookup_selector_methods(
        &self,
        _decls: &DeclArena,
        selector: Identifier,
        results: &mut Vec<DeclId>,
    ) {
        self.index.lookup_selector_methods(selector, results);
    }

    fn discriminator_for_private_value(&self, _decls: &DeclArena, decl: DeclId) -> Option<&str> {
        self.private_discriminators.get(&decl).map(String::as_str)
    }

    fn lookup_visible_decls(
        &self,
        _decls: &DeclArena,
        access_path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
        _kind: LookupKind,
    ) {
        self.index
            .for_each_visible_value(access_path, |d| consumer.found_decl(d, DeclVisibility::TopLevel));
    }

    fn lookup_class_members(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
    ) {
        self.index.for_each_class_member(decls, access_path, |d| {
            consumer.found_decl(d, DeclVisibility::DynamicLookup)
        });
    }

    fn lookup_class_member(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        name: &DeclName,
        results: &mut Vec<DeclId>,
    ) {
        self.index
            .lookup_class_member(decls, access_path, name, results);
    }

    fn lookup_local_type(&self, _decls: &DeclArena, mangled: &str) -> Option<DeclId> {
        self.index.lookup_local_type(mangled)
    }

    fn lookup_operator(
        &self,
        _decls: &DeclArena,
        fixity: OperatorFixity,
        name: Identifier,
    ) -> Option<DeclId> {
        self.index.lookup_operator(fixity, name)
    }

    fn lookup_precedence_group(&self, _decls: &DeclArena, name: Identifier) -> Option<DeclId> {
        self.index.lookup_precedence_group(name)
    }

    fn top_level_decls(&self, results: &mut Vec<DeclId>) {
        results.extend_from_slice(&self.top_level);
    }

    fn local_type_decls(&self, results: &mut Vec<DeclId>) {
        results.extend_from_slice(&self.local_types);
    }

    fn precedence_groups(&self, _decls: &DeclArena, results: &mut Vec<DeclId>) {
        results.extend(self.index.precedence_groups());
    }

    fn imported_modules(&self, imports: &mut Vec<ImportedModule>, filter: ImportFilter) {
        imports.extend(
            self.imports
                .iter()
                .filter(|(_, category)| filter.contains(*category))
                .map(|(edge, _)| edge.clone()),
        );
    }

    fn collect_link_libraries(&self, callback: &mut dyn FnMut(&LinkLibrary)) {
        for library in &self.link_libraries {
            callback(library);
        }
    }

    fn has_entry_point(&self) -> bool {
        self.main_class.is_some()
    }

    fn main_class(&self) -> Option<DeclId> {
        self.main_class
    }
}

/// Collects the content of a loaded unit, then indexes it once.
#[derive(Debug)]
pub struct LoadedFileBuilder {
    kind: LoadedFileKind,
    filename: String,
    top_level: Vec<DeclId>,
    local_types: Vec<DeclId>,
    imports: Vec<(ImportedModule, ImportFilter)>,
    private_discriminators: FxHashMap<DeclId, String>,
    overlay: Option<ModuleId>,
    is_system: bool,
    link_libraries: Vec<LinkLibrary>,
    main_class: Option<DeclId>,
    foreign: Option<ForeignModuleInfo>,
}

impl LoadedFileBuilder {
    pub fn new(kind: LoadedFileKind, filename: impl Into<String>) -> Self {
        Self {
            kind,
            filename: filename.into(),
            top_level: Vec::new(),
            local_types: Vec::new(),
            imports: Vec::new(),
            private_discriminators: FxHashMap::default(),
            overlay: None,
            is_system: false,
            link_libraries: Vec::new(),
            main_class: None,
            foreign: None,
        }
    }

    pub fn decls(mut self, decls: impl IntoIterator<Item = DeclId>) -> Self {
        self.top_level.extend(decls);
        self
    }

    pub fn local_types(mut self, decls: impl IntoIterator<Item = DeclId>) -> Self {
        self.local_types.extend(decls);
        self
    }

    /// Add an import edge. `category` must be a single filter category.
    pub fn import(mut self, edge: ImportedModule, category: ImportFilter) -> Self {
        debug_assert!(
            category.bits().count_ones() == 1,
            "import edge must belong to exactly one category"
        );
        self.imports.push((edge, category));
        self
    }

    pub fn private_discriminator(mut self, decl: DeclId, discriminator: impl Into<String>) -> Self {
        self.private_discriminators
            .insert(decl, discriminator.into());
        self
    }

    pub fn overlay(mut self, module: ModuleId) -> Self {
        self.overlay = Some(module);
        self
    }

    pub fn system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }

    pub fn link_library(mut self, library: LinkLibrary) -> Self {
        self.link_libraries.push(library);
        self
    }

    pub fn main_class(mut self, class: DeclId) -> Self {
        self.main_class = Some(class);
        self
    }

    pub fn foreign(mut self, info: ForeignModuleInfo) -> Self {
        self.foreign = Some(info);
        self
    }

    pub fn build(self, decls: &DeclArena) -> LoadedFile {
        let index = LookupCache::build(
            decls,
            self.top_level.iter().copied(),
            self.local_types.iter().copied(),
        );
        tracing::debug!(
            kind = ?self.kind,
            file = %self.filename,
            decls = self.top_level.len(),
            imports = self.imports.len(),
            "loaded unit indexed"
        );
        LoadedFile {
            kind: self.kind,
            filename: self.filename,
            top_level: self.top_level,
            local_types: self.local_types,
            index,
            imports: self.imports,
            private_filenames: FxHashMap::default(),
            private_discriminators: self.private_discriminators,
            overlay: self.overlay,
            is_system: self.is_system,
            link_libraries: self.link_libraries,
            main_class: self.main_class,
            foreign: self.foreign,
        }
    }
}
