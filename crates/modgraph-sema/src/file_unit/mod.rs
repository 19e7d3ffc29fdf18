//! The source-unit family: parsed files, the builtin unit, and loaded files.
//!
//! The variant set is closed, so units are a tagged enum (`FileUnitData`)
//! behind one capability trait (`UnitLookup`). Every variant answers the same
//! queries; a variant that has nothing to say (no imports, no operators)
//! returns empty results instead of failing.

mod builtin;
mod loaded;
mod source;

pub use builtin::BuiltinUnit;
pub use loaded::{ForeignModuleInfo, LoadedFile, LoadedFileBuilder, LoadedFileKind};
pub use source::{SourceFile, SourceFileKind};

use std::fmt;

use modgraph_identity::{AccessPath, DeclId, DeclName, Identifier, ModuleId, UnitId};

use crate::decl::{DeclArena, OperatorFixity};
use crate::import::{ImportFilter, ImportedModule, LinkLibrary};
use crate::module::LookupKind;
use crate::walker::{DeclWalker, VisibleDeclConsumer, walk_decls};

/// Discriminant of a unit, fixed when the unit is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileUnitKind {
    Source,
    Builtin,
    SerializedAst,
    ForeignModule,
    DebugInfoModule,
}

impl FileUnitKind {
    pub fn is_loaded(self) -> bool {
        matches!(
            self,
            FileUnitKind::SerializedAst | FileUnitKind::ForeignModule | FileUnitKind::DebugInfoModule
        )
    }
}

impl fmt::Display for FileUnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileUnitKind::Source => "source file",
            FileUnitKind::Builtin => "builtin unit",
            FileUnitKind::SerializedAst => "serialized module",
            FileUnitKind::ForeignModule => "foreign module",
            FileUnitKind::DebugInfoModule => "debug-info module",
        };
        f.write_str(name)
    }
}

/// Queries every unit answers.
pub trait UnitLookup {
    /// Append the top-level values `name` can refer to through `access_path`.
    fn lookup_value(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        name: &DeclName,
        kind: LookupKind,
        results: &mut Vec<DeclId>,
    );

    /// Append methods reachable through dynamic dispatch under `selector`.
    fn lookup_selector_methods(
        &self,
        decls: &DeclArena,
        selector: Identifier,
        results: &mut Vec<DeclId>,
    );

    fn discriminator_for_private_value(&self, decls: &DeclArena, decl: DeclId) -> Option<&str>;

    fn lookup_visible_decls(
        &self,
        _decls: &DeclArena,
        _access_path: &AccessPath,
        _consumer: &mut dyn VisibleDeclConsumer,
        _kind: LookupKind,
    ) {
    }

    fn lookup_class_members(
        &self,
        _decls: &DeclArena,
        _access_path: &AccessPath,
        _consumer: &mut dyn VisibleDeclConsumer,
    ) {
    }

    fn lookup_class_member(
        &self,
        _decls: &DeclArena,
        _access_path: &AccessPath,
        _name: &DeclName,
        _results: &mut Vec<DeclId>,
    ) {
    }

    fn lookup_local_type(&self, _decls: &DeclArena, _mangled: &str) -> Option<DeclId> {
        None
    }

    fn lookup_operator(
        &self,
        _decls: &DeclArena,
        _fixity: OperatorFixity,
        _name: Identifier,
    ) -> Option<DeclId> {
        None
    }

    fn lookup_precedence_group(&self, _decls: &DeclArena, _name: Identifier) -> Option<DeclId> {
        None
    }

    fn top_level_decls(&self, _results: &mut Vec<DeclId>) {}

    fn local_type_decls(&self, _results: &mut Vec<DeclId>) {}

    fn precedence_groups(&self, _decls: &DeclArena, _results: &mut Vec<DeclId>) {}

    /// Declarations shown to a user browsing the unit
    fn display_decls(&self, results: &mut Vec<DeclId>) {
        self.top_level_decls(results);
    }

    fn imported_modules(&self, _imports: &mut Vec<ImportedModule>, _filter: ImportFilter) {}

    /// Edges followed when resolving names visible to clients of the unit
    fn imported_modules_for_lookup(&self, imports: &mut Vec<ImportedModule>) {
        self.imported_modules(imports, ImportFilter::PUBLIC);
    }

    fn collect_link_libraries(&self, _callback: &mut dyn FnMut(&LinkLibrary)) {}

    fn has_entry_point(&self) -> bool {
        false
    }

    fn main_class(&self) -> Option<DeclId> {
        None
    }

    /// Walk the unit's top-level declarations. Returns true if aborted.
    fn walk(&self, decls: &DeclArena, walker: &mut dyn DeclWalker) -> bool {
        let mut roots = Vec::new();
        self.top_level_decls(&mut roots);
        walk_decls(decls, roots, walker)
    }
}

#[derive(Debug)]
pub enum FileUnitData {
    Source(SourceFile),
    Builtin(BuiltinUnit),
    Loaded(LoadedFile),
}

impl From<SourceFile> for FileUnitData {
    fn from(file: SourceFile) -> Self {
        FileUnitData::Source(file)
    }
}

impl From<BuiltinUnit> for FileUnitData {
    fn from(unit: BuiltinUnit) -> Self {
        FileUnitData::Builtin(unit)
    }
}

impl From<LoadedFile> for FileUnitData {
    fn from(file: LoadedFile) -> Self {
        FileUnitData::Loaded(file)
    }
}

/// One constituent of a module. Owned by the module; `parent` is a handle
/// back to it.
#[derive(Debug)]
pub struct FileUnit {
    id: UnitId,
    parent: ModuleId,
    data: FileUnitData,
}

impl FileUnit {
    pub(crate) fn new(id: UnitId, parent: ModuleId, data: FileUnitData) -> Self {
        Self { id, parent, data }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn parent_module(&self) -> ModuleId {
        self.parent
    }

    pub fn kind(&self) -> FileUnitKind {
        match &self.data {
            FileUnitData::Source(_) => FileUnitKind::Source,
            FileUnitData::Builtin(_) => FileUnitKind::Builtin,
            FileUnitData::Loaded(file) => file.kind().into(),
        }
    }

    pub fn data(&self) -> &FileUnitData {
        &self.data
    }

    pub fn as_source(&self) -> Option<&SourceFile> {
        match &self.data {
            FileUnitData::Source(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_source_mut(&mut self) -> Option<&mut SourceFile> {
        match &mut self.data {
            FileUnitData::Source(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_loaded(&self) -> Option<&LoadedFile> {
        match &self.data {
            FileUnitData::Loaded(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_loaded_mut(&mut self) -> Option<&mut LoadedFile> {
        match &mut self.data {
            FileUnitData::Loaded(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_builtin(&self) -> Option<&BuiltinUnit> {
        match &self.data {
            FileUnitData::Builtin(unit) => Some(unit),
            _ => None,
        }
    }

    /// The shared query surface of whichever variant this is
    pub fn as_lookup(&self) -> &dyn UnitLookup {
        match &self.data {
            FileUnitData::Source(file) => file,
            FileUnitData::Builtin(unit) => unit,
            FileUnitData::Loaded(file) => file,
        }
    }
}
