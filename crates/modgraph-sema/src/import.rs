// import.rs
//
// Import edges between compilation units, the filters used to select them,
// and link libraries derived from them.

use modgraph_identity::{AccessPath, ModuleId, Span};

use crate::errors::ModuleError;
use crate::option_set::define_option_set;

define_option_set! {
    /// Which import categories participate in a query
    pub struct ImportFilter: u8 {
        /// Re-exported imports, visible to clients of the module
        const PUBLIC = 1 << 0;
        /// Ordinary imports, visible only inside the importing module
        const PRIVATE = 1 << 1;
        /// Imports whose declarations must not leak into the interface
        const IMPLEMENTATION_ONLY = 1 << 2;
    }
}

define_option_set! {
    /// Options written on an individual import declaration
    pub struct ImportOptions: u8 {
        const EXPORTED = 1 << 0;
        const TESTABLE = 1 << 1;
        const PRIVATE_IMPORT = 1 << 2;
        const IMPLEMENTATION_ONLY = 1 << 3;
    }
}

impl ImportOptions {
    /// The single filter category an import with these options belongs to.
    pub fn category(self) -> ImportFilter {
        if self.contains(ImportOptions::EXPORTED) {
            ImportFilter::PUBLIC
        } else if self.contains(ImportOptions::IMPLEMENTATION_ONLY) {
            ImportFilter::IMPLEMENTATION_ONLY
        } else {
            ImportFilter::PRIVATE
        }
    }
}

/// A non-owning edge in the import graph.
///
/// Equality ignores access-path locations: two edges are equal when they
/// target the same module through the same identifier sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportedModule {
    pub access_path: AccessPath,
    pub module: ModuleId,
}

impl ImportedModule {
    pub fn new(access_path: AccessPath, module: ModuleId) -> Self {
        Self {
            access_path,
            module,
        }
    }

    /// Whole-module import
    pub fn whole(module: ModuleId) -> Self {
        Self::new(AccessPath::empty(), module)
    }
}

/// Normalize a list of edges: one entry per (module, access-path names).
///
/// The result is sorted, so it does not depend on input order and applying
/// it twice is the same as applying it once.
pub fn remove_duplicate_imports(imports: &mut Vec<ImportedModule>) {
    imports.sort_by(|lhs, rhs| {
        lhs.module
            .cmp(&rhs.module)
            .then_with(|| lhs.access_path.cmp(&rhs.access_path))
    });
    imports.dedup();
}

/// An import as written in a parsed file, after name binding.
#[derive(Debug, Clone)]
pub struct ImportedModuleDesc {
    pub module: ImportedModule,
    pub options: ImportOptions,
    /// For `@_private(sourceFile:)` imports, the file whose private
    /// declarations become visible
    pub filename: Option<String>,
    pub span: Option<Span>,
}

impl ImportedModuleDesc {
    pub fn new(module: ImportedModule, options: ImportOptions) -> Result<Self, ModuleError> {
        if options.contains(ImportOptions::EXPORTED | ImportOptions::IMPLEMENTATION_ONLY) {
            return Err(ModuleError::ConflictingImportOptions { span: None });
        }
        Ok(Self {
            module,
            options,
            filename: None,
            span: None,
        })
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn category(&self) -> ImportFilter {
        self.options.category()
    }
}

/// Query kinds for `has_testable_or_private_import`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportQueryKind {
    TestableAndPrivate,
    TestableOnly,
    PrivateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryKind {
    Library,
    Framework,
}

/// A library the linker must pull in because some module was imported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkLibrary {
    pub name: String,
    pub kind: LibraryKind,
    pub force_load: bool,
}

impl LinkLibrary {
    pub fn new(name: impl Into<String>, kind: LibraryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            force_load: false,
        }
    }

    pub fn force_loaded(mut self) -> Self {
        self.force_load = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgraph_identity::Interner;

    #[test]
    fn exported_and_implementation_only_conflict() {
        let edge = ImportedModule::whole(ModuleId::new(1));
        let result = ImportedModuleDesc::new(
            edge,
            ImportOptions::EXPORTED | ImportOptions::IMPLEMENTATION_ONLY,
        );
        assert!(matches!(
            result,
            Err(ModuleError::ConflictingImportOptions { .. })
        ));
    }

    #[test]
    fn categories() {
        assert_eq!(ImportOptions::EXPORTED.category(), ImportFilter::PUBLIC);
        assert_eq!(
            (ImportOptions::TESTABLE | ImportOptions::PRIVATE_IMPORT).category(),
            ImportFilter::PRIVATE
        );
        assert_eq!(
            ImportOptions::IMPLEMENTATION_ONLY.category(),
            ImportFilter::IMPLEMENTATION_ONLY
        );
        assert_eq!(ImportOptions::empty().category(), ImportFilter::PRIVATE);
    }

    #[test]
    fn remove_duplicates_ignores_locations_and_order() {
        let mut interner = Interner::new();
        let foo = interner.intern("foo");
        let a = ModuleId::new(3);
        let b = ModuleId::new(1);

        let mut first = vec![
            ImportedModule::new(AccessPath::single(foo, Span::at_line(1, 1)), a),
            ImportedModule::whole(b),
            ImportedModule::new(AccessPath::single(foo, Span::at_line(5, 2)), a),
            ImportedModule::whole(a),
            ImportedModule::whole(b),
        ];
        let mut second: Vec<_> = first.iter().rev().cloned().collect();

        remove_duplicate_imports(&mut first);
        remove_duplicate_imports(&mut second);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);

        let once = first.clone();
        remove_duplicate_imports(&mut first);
        assert_eq!(first, once);
    }
}
