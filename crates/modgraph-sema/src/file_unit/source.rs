// file_unit/source.rs
//
// A file produced by the parser. The only unit kind with a mutable lookup
// cache, a private discriminator, an interface fingerprint, and entry-point
// eligibility.

use std::cell::OnceCell;

use modgraph_identity::{AccessPath, DeclId, DeclName, Identifier, ModuleId, Span};

use super::UnitLookup;
use crate::decl::{AccessLevel, DeclArena, OperatorFixity};
use crate::errors::ModuleError;
use crate::import::{ImportFilter, ImportOptions, ImportQueryKind, ImportedModule, ImportedModuleDesc};
use crate::interface_hash::{InterfaceHash, InterfaceHasher};
use crate::lookup_cache::LookupCache;
use crate::module::LookupKind;
use crate::walker::{DeclVisibility, VisibleDeclConsumer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFileKind {
    /// An ordinary file
    Library,
    /// A file that may contain top-level code
    Main,
    /// The virtual file holding interactive input
    Repl,
    /// Intermediate-language text
    Sil,
    /// A textual interface of another module
    Interface,
}

#[derive(Debug)]
pub struct SourceFile {
    kind: SourceFileKind,
    filename: String,
    buffer_id: Option<u32>,
    decls: Vec<DeclId>,
    local_type_decls: Vec<DeclId>,
    imports: Vec<ImportedModuleDesc>,
    has_implementation_only_imports: bool,
    cache: OnceCell<LookupCache>,
    cached_visible_decls: Option<Vec<DeclId>>,
    private_discriminator: Option<String>,
    main_class: Option<(DeclId, Option<Span>)>,
    interface_hash: Option<InterfaceHasher>,
}

impl SourceFile {
    pub fn new(kind: SourceFileKind, filename: impl Into<String>) -> Self {
        Self {
            kind,
            filename: filename.into(),
            buffer_id: None,
            decls: Vec::new(),
            local_type_decls: Vec::new(),
            imports: Vec::new(),
            has_implementation_only_imports: false,
            cache: OnceCell::new(),
            cached_visible_decls: None,
            private_discriminator: None,
            main_class: None,
            interface_hash: None,
        }
    }

    pub fn with_buffer_id(mut self, buffer_id: u32) -> Self {
        self.buffer_id = Some(buffer_id);
        self
    }

    pub fn with_decls(mut self, decls: impl IntoIterator<Item = DeclId>) -> Self {
        self.decls.extend(decls);
        self
    }

    pub fn kind(&self) -> SourceFileKind {
        self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn buffer_id(&self) -> Option<u32> {
        self.buffer_id
    }

    pub fn decls(&self) -> &[DeclId] {
        &self.decls
    }

    /// Append a top-level declaration. The lookup cache is not touched; call
    /// `clear_lookup_cache` (and the module's) once the batch is complete.
    pub fn add_decl(&mut self, decl: DeclId) {
        self.decls.push(decl);
    }

    pub fn add_local_type_decl(&mut self, decl: DeclId) {
        if !self.local_type_decls.contains(&decl) {
            self.local_type_decls.push(decl);
        }
    }

    /// True for files whose top-level code runs as the program
    pub fn is_script_mode(&self) -> bool {
        match self.kind {
            SourceFileKind::Main | SourceFileKind::Repl => true,
            SourceFileKind::Library | SourceFileKind::Sil | SourceFileKind::Interface => false,
        }
    }

    // ===== Imports =====

    /// Record imports resolved by name binding.
    pub fn add_imports(&mut self, imports: impl IntoIterator<Item = ImportedModuleDesc>) {
        for desc in imports {
            if desc.options.contains(ImportOptions::IMPLEMENTATION_ONLY) {
                self.has_implementation_only_imports = true;
            }
            self.imports.push(desc);
        }
    }

    pub fn imports(&self) -> &[ImportedModuleDesc] {
        &self.imports
    }

    pub fn has_implementation_only_imports(&self) -> bool {
        self.has_implementation_only_imports
    }

    /// Whether this file imports `decl_module` in a way that exposes a
    /// declaration with `access`. For private and fileprivate declarations the
    /// caller supplies the file the declaration originally came from.
    pub fn has_testable_or_private_import(
        &self,
        access: AccessLevel,
        decl_module: ModuleId,
        private_filename: Option<&str>,
        query: ImportQueryKind,
    ) -> bool {
        let targets = |desc: &&ImportedModuleDesc| desc.module.module == decl_module;
        match access {
            AccessLevel::Open => return true,
            AccessLevel::Internal | AccessLevel::Public => {
                // Only an import marked private or testable is needed; the
                // filename does not have to match.
                return self.imports.iter().filter(targets).any(|desc| match query {
                    ImportQueryKind::TestableAndPrivate => desc
                        .options
                        .intersects(ImportOptions::PRIVATE_IMPORT | ImportOptions::TESTABLE),
                    ImportQueryKind::TestableOnly => desc.options.contains(ImportOptions::TESTABLE),
                    ImportQueryKind::PrivateOnly => {
                        desc.options.contains(ImportOptions::PRIVATE_IMPORT)
                    }
                });
            }
            AccessLevel::FilePrivate | AccessLevel::Private => {}
        }

        if query == ImportQueryKind::TestableOnly {
            return false;
        }
        let Some(filename) = private_filename.filter(|f| !f.is_empty()) else {
            return false;
        };
        self.imports.iter().filter(targets).any(|desc| {
            desc.options.contains(ImportOptions::PRIVATE_IMPORT)
                && desc.filename.as_deref() == Some(filename)
        })
    }

    // ===== Lookup cache =====

    /// Drop the per-file lookup cache after the declaration list changed.
    pub fn clear_lookup_cache(&mut self) {
        if self.cache.take().is_some() {
            tracing::trace!(file = %self.filename, "source file lookup cache cleared");
        }
        self.cached_visible_decls = None;
    }

    /// Build the per-file lookup cache if it is missing.
    pub fn ensure_lookup_cache(&self, decls: &DeclArena) -> &LookupCache {
        self.cache.get_or_init(|| {
            LookupCache::build(
                decls,
                self.decls.iter().copied(),
                self.local_type_decls.iter().copied(),
            )
        })
    }

    /// Remember the completion results computed for this file.
    pub fn cache_visible_decls(&mut self, globals: Vec<DeclId>) {
        self.cached_visible_decls = Some(globals);
    }

    pub fn cached_visible_decls(&self) -> Option<&[DeclId]> {
        self.cached_visible_decls.as_deref()
    }

    // ===== Private discriminator =====

    pub fn private_discriminator(&self) -> Option<&str> {
        self.private_discriminator.as_deref()
    }

    pub(crate) fn set_private_discriminator(&mut self, discriminator: String) {
        self.private_discriminator = Some(discriminator);
    }

    // ===== Entry point =====

    pub fn main_class_span(&self) -> Option<Span> {
        self.main_class.and_then(|(_, span)| span)
    }

    pub(crate) fn set_main_class(&mut self, class: DeclId, span: Option<Span>) {
        self.main_class = Some((class, span));
    }

    // ===== Interface hash =====

    pub fn enable_interface_hash(&mut self) -> Result<(), ModuleError> {
        if self.interface_hash.is_some() {
            return Err(ModuleError::InterfaceHashAlreadyEnabled {
                filename: self.filename.clone(),
            });
        }
        self.interface_hash = Some(InterfaceHasher::new());
        Ok(())
    }

    pub fn has_interface_hash(&self) -> bool {
        self.interface_hash.is_some()
    }

    /// Feed one interface token. Files that did not opt in ignore tokens.
    pub fn record_interface_token(&mut self, token: &str) {
        if let Some(hasher) = &mut self.interface_hash {
            hasher.record_token(token);
        }
    }

    /// Finalize the fingerprint. The accumulator is consumed, so a second
    /// call returns `None`.
    pub fn take_interface_hash(&mut self) -> Option<InterfaceHash> {
        let hasher = self.interface_hash.take()?;
        tracing::debug!(file = %self.filename, tokens = hasher.token_count(), "interface hash finalized");
        Some(hasher.finalize())
    }
}

impl UnitLookup for SourceFile {
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
        self.ensure_lookup_cache(decls)
            .lookup_value(decls, name, results);
    }

    fn lookup_selector_methods(
        &self,
        decls: &DeclArena,
        selector: Identifier,
        results: &mut Vec<DeclId>,
    ) {
        self.ensure_lookup_cache(decls)
            .lookup_selector_methods(selector, results);
    }

    fn discriminator_for_private_value(&self, decls: &DeclArena, decl: DeclId) -> Option<&str> {
        debug_assert!(
            decls.get(decl).access.is_file_scoped(),
            "discriminators only apply to private declarations"
        );
        self.private_discriminator()
    }

    fn lookup_visible_decls(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
        _kind: LookupKind,
    ) {
        self.ensure_lookup_cache(decls)
            .for_each_visible_value(access_path, |d| consumer.found_decl(d, DeclVisibility::TopLevel));
    }

    fn lookup_class_members(
        &self,
        decls: &DeclArena,
        access_path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
    ) {
        self.ensure_lookup_cache(decls)
            .for_each_class_member(decls, access_path, |d| {
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
        self.ensure_lookup_cache(decls)
            .lookup_class_member(decls, access_path, name, results);
    }

    fn lookup_local_type(&self, decls: &DeclArena, mangled: &str) -> Option<DeclId> {
        self.ensure_lookup_cache(decls).lookup_local_type(mangled)
    }

    fn lookup_operator(
        &self,
        decls: &DeclArena,
        fixity: OperatorFixity,
        name: Identifier,
    ) -> Option<DeclId> {
        self.ensure_lookup_cache(decls).lookup_operator(fixity, name)
    }

    fn lookup_precedence_group(&self, decls: &DeclArena, name: Identifier) -> Option<DeclId> {
        self.ensure_lookup_cache(decls).lookup_precedence_group(name)
    }

    fn top_level_decls(&self, results: &mut Vec<DeclId>) {
        results.extend_from_slice(&self.decls);
    }

    fn local_type_decls(&self, results: &mut Vec<DeclId>) {
        results.extend_from_slice(&self.local_type_decls);
    }

    fn precedence_groups(&self, decls: &DeclArena, results: &mut Vec<DeclId>) {
        results.extend(self.ensure_lookup_cache(decls).precedence_groups());
    }

    fn imported_modules(&self, imports: &mut Vec<ImportedModule>, filter: ImportFilter) {
        imports.extend(
            self.imports
                .iter()
                .filter(|desc| filter.contains(desc.category()))
                .map(|desc| desc.module.clone()),
        );
    }

    fn has_entry_point(&self) -> bool {
        self.is_script_mode() || self.main_class.is_some()
    }

    fn main_class(&self) -> Option<DeclId> {
        self.main_class.map(|(class, _)| class)
    }
}
