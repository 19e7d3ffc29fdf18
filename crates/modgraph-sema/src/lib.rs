//! Module and symbol-visibility engine: compilation units, their source
//! units, lookup caches, import-graph traversal and entry-point bookkeeping.

pub mod conformance;
pub mod context;
pub mod debugger;
pub mod decl;
pub mod errors;
pub mod file_unit;
pub mod import;
pub mod interface_hash;
pub mod lookup_cache;
pub mod module;
mod option_set;
mod visible_modules;
pub mod walker;

pub use conformance::{
    ConformanceRef, ConformanceRequirement, ConformanceSolver, ProtocolConformance,
};
pub use context::{ContextOptions, ModuleContext};
pub use debugger::DebuggerClient;
pub use decl::{AccessLevel, ArtificialMainKind, Decl, DeclArena, DeclKind, OperatorFixity};
pub use errors::ModuleError;
pub use file_unit::{
    BuiltinUnit, FileUnit, FileUnitData, FileUnitKind, ForeignModuleInfo, LoadedFile,
    LoadedFileBuilder, LoadedFileKind, SourceFile, SourceFileKind, UnitLookup,
};
pub use import::{
    ImportFilter, ImportOptions, ImportQueryKind, ImportedModule, ImportedModuleDesc,
    LibraryKind, LinkLibrary, remove_duplicate_imports,
};
pub use interface_hash::{InterfaceHash, InterfaceHasher};
pub use lookup_cache::LookupCache;
pub use module::{
    EntryPointCause, EntryPointInfo, LookupKind, Module, ModuleFlags, ModuleOptions,
    ResilienceStrategy,
};
pub use walker::{DeclVisibility, DeclWalker, VisibleDeclConsumer};

pub use modgraph_identity::{AccessPath, DeclId, DeclName, Identifier, ModuleId, Span, TypeRef, UnitId};
