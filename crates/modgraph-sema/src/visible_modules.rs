//! Transitive import-graph queries.
//!
//! Traversal follows re-exported (public) edges only. Each module is visited
//! at most once, along the first access path that reaches it; a later path
//! is dropped, even when it would have exposed a different name. Paths are
//! merged along an edge chain: an empty path takes the other side, equal
//! paths are kept, and two different non-empty paths make the edge
//! unreachable.

use modgraph_identity::{AccessPath, ModuleId, UnitId};
use rustc_hash::FxHashSet;

use crate::context::ModuleContext;
use crate::errors::ModuleError;
use crate::file_unit::{FileUnit, SourceFileKind, UnitLookup};
use crate::import::{ImportFilter, ImportOptions, ImportedModule, LinkLibrary};

impl ModuleContext {
    /// Visit `root` under `root_path`, then every module it re-exports,
    /// transitively. Returns false iff `visit` returned false.
    pub fn for_all_visible_modules(
        &self,
        root: ModuleId,
        root_path: &AccessPath,
        mut visit: impl FnMut(&ImportedModule) -> bool,
    ) -> bool {
        let stack = vec![ImportedModule::new(root_path.clone(), root)];
        self.walk_visible(stack, &mut visit)
    }

    /// Everything visible from inside the source file `unit`: its own module,
    /// then whatever its private and implementation-only imports expose.
    pub fn for_all_visible_modules_from_file(
        &self,
        unit: UnitId,
        mut visit: impl FnMut(&ImportedModule) -> bool,
    ) -> Result<bool, ModuleError> {
        let source = self.source_file(unit)?;
        let parent = self.owning_module(unit).ok_or(ModuleError::UnknownUnit(unit))?;

        let mut edges = Vec::new();
        source.imported_modules(
            &mut edges,
            ImportFilter::PRIVATE | ImportFilter::IMPLEMENTATION_ONLY,
        );
        let mut stack = Vec::with_capacity(edges.len() + 1);
        for edge in edges.into_iter().rev() {
            self.push_edge(&mut stack, edge);
        }
        stack.push(ImportedModule::whole(parent));
        Ok(self.walk_visible(stack, &mut visit))
    }

    fn walk_visible(
        &self,
        mut stack: Vec<ImportedModule>,
        visit: &mut dyn FnMut(&ImportedModule) -> bool,
    ) -> bool {
        let mut visited = FxHashSet::default();
        let mut children = Vec::new();
        while let Some(next) = stack.pop() {
            let Some(module) = self.module(next.module) else {
                tracing::warn!(module = ?next.module, "skipping dangling import edge");
                continue;
            };
            if !visited.insert(next.module) {
                tracing::trace!(module = %module.name_str(), "already visited");
                continue;
            }
            tracing::trace!(module = %module.name_str(), path_len = next.access_path.len(), "visiting module");
            if !visit(&next) {
                tracing::debug!(module = %module.name_str(), "visible-module traversal stopped early");
                return false;
            }

            module.imported_modules_for_lookup(&mut children);
            for edge in children.drain(..).rev() {
                let Some(access_path) = merge_access_paths(&next.access_path, &edge.access_path)
                else {
                    tracing::trace!(
                        from = %module.name_str(),
                        to = ?edge.module,
                        "incompatible access paths, edge dropped"
                    );
                    continue;
                };
                self.push_edge(&mut stack, ImportedModule::new(access_path, edge.module));
            }
        }
        true
    }

    fn push_edge(&self, stack: &mut Vec<ImportedModule>, edge: ImportedModule) {
        if self
            .module(edge.module)
            .is_some_and(|target| !target.is_lookup_target())
        {
            tracing::trace!(module = ?edge.module, "not a lookup target, skipped");
            return;
        }
        stack.push(edge);
    }

    /// Whether every way the source file `unit` sees `target` goes through an
    /// implementation-only import.
    pub fn is_imported_implementation_only(
        &self,
        unit: UnitId,
        target: ModuleId,
    ) -> Result<bool, ModuleError> {
        let source = self.source_file(unit)?;
        if !source.has_implementation_only_imports() {
            return Ok(false);
        }

        let imported_by = |from: ModuleId| {
            from == target
                || !self.for_all_visible_modules(from, &AccessPath::empty(), |edge| {
                    edge.module != target
                })
        };
        let visible_elsewhere = source
            .imports()
            .iter()
            .filter(|desc| !desc.options.contains(ImportOptions::IMPLEMENTATION_ONLY))
            .any(|desc| imported_by(desc.module.module));
        if visible_elsewhere {
            return Ok(false);
        }
        let parent = self.owning_module(unit).ok_or(ModuleError::UnknownUnit(unit))?;
        Ok(!imported_by(parent))
    }

    /// Report the link libraries of every module `root` depends on.
    ///
    /// Follows public and private imports, plus the root's implementation-only
    /// imports. The root's own libraries are not reported, and modules whose
    /// main unit is a REPL input are skipped along with their imports.
    /// Libraries are reported once per module, so the same library can come
    /// up more than once.
    pub fn collect_link_libraries(
        &self,
        root: ModuleId,
        mut callback: impl FnMut(&LinkLibrary),
    ) -> Result<(), ModuleError> {
        let top = self.try_module(root)?;
        let filter = ImportFilter::PUBLIC | ImportFilter::PRIVATE;
        let mut top_filter = filter;
        if !top.is_foreign_module() {
            top_filter |= ImportFilter::IMPLEMENTATION_ONLY;
        }

        let mut stack = Vec::new();
        top.imported_modules(&mut stack, top_filter);
        stack.push(ImportedModule::whole(root));

        let mut visited = FxHashSet::default();
        let mut reported = 0usize;
        while let Some(next) = stack.pop() {
            if !visited.insert(next.module) {
                continue;
            }
            let Some(module) = self.module(next.module) else {
                tracing::warn!(module = ?next.module, "skipping dangling import edge");
                continue;
            };
            if next.module != root {
                if module.files().first().is_some_and(is_repl_file) {
                    tracing::trace!(module = %module.name_str(), "repl module, libraries assumed linked");
                    continue;
                }
                module.collect_link_libraries(&mut |library| {
                    reported += 1;
                    callback(library);
                });
            }
            module.imported_modules(&mut stack, filter);
        }
        tracing::debug!(module = %top.name_str(), modules = visited.len(), libraries = reported, "link libraries collected");
        Ok(())
    }
}

fn is_repl_file(file: &FileUnit) -> bool {
    file.as_source()
        .is_some_and(|source| source.kind() == SourceFileKind::Repl)
}

/// Combine the path used to reach a module with the path on one of its
/// edges. `None` when the two name different declarations.
fn merge_access_paths(reached: &AccessPath, edge: &AccessPath) -> Option<AccessPath> {
    if edge.is_empty() || reached.is_same(edge) {
        Some(reached.clone())
    } else if reached.is_empty() {
        Some(edge.clone())
    } else {
        None
    }
}
