// module/entry_point.rs
//
// Which unit supplies the program's entry point, and which conflicts have
// already been reported.

use std::fmt;

use modgraph_identity::{DeclId, Span, UnitId};

use super::Module;
use crate::decl::{ArtificialMainKind, DeclArena, DeclKind};
use crate::errors::ModuleError;
use crate::file_unit::UnitLookup;

/// Why a second entry-point registration was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPointCause {
    /// The registered unit already has a main class
    MultipleMainClasses,
    /// The registered unit is a script with top-level code
    MainClassWithScript,
}

impl fmt::Display for EntryPointCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPointCause::MultipleMainClasses => f.write_str("multiple main classes"),
            EntryPointCause::MainClassWithScript => {
                f.write_str("main class in a module with top-level code")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryPointInfo {
    file: Option<UnitId>,
    diagnosed_multiple_main_classes: bool,
    diagnosed_main_class_with_script: bool,
}

impl EntryPointInfo {
    pub fn file(&self) -> Option<UnitId> {
        self.file
    }

    pub fn has_entry_point(&self) -> bool {
        self.file.is_some()
    }

    /// Returns true the first time only.
    pub fn mark_diagnosed_multiple_main_classes(&mut self) -> bool {
        !std::mem::replace(&mut self.diagnosed_multiple_main_classes, true)
    }

    /// Returns true the first time only.
    pub fn mark_diagnosed_main_class_with_script(&mut self) -> bool {
        !std::mem::replace(&mut self.diagnosed_main_class_with_script, true)
    }

    fn mark_diagnosed(&mut self, cause: EntryPointCause) -> bool {
        match cause {
            EntryPointCause::MultipleMainClasses => self.mark_diagnosed_multiple_main_classes(),
            EntryPointCause::MainClassWithScript => self.mark_diagnosed_main_class_with_script(),
        }
    }

    /// Forget the registration if it points at `unit`. Diagnosed flags stay.
    pub(crate) fn forget(&mut self, unit: UnitId) {
        if self.file == Some(unit) {
            self.file = None;
        }
    }
}

impl Module {
    pub fn entry_point_info(&self) -> &EntryPointInfo {
        &self.entry_point
    }

    pub fn entry_point_info_mut(&mut self) -> &mut EntryPointInfo {
        &mut self.entry_point
    }

    pub fn has_entry_point(&self) -> bool {
        self.entry_point.has_entry_point()
    }

    /// Register `unit` as the unit that provides the entry point.
    ///
    /// Fails if another registration already happened. Without a location the
    /// failure carries no cause and is never worth reporting; with one, the
    /// error says whether this is the first report of its cause.
    pub fn register_entry_point_file(
        &mut self,
        unit: UnitId,
        loc: Option<Span>,
        kind: Option<ArtificialMainKind>,
    ) -> Result<(), ModuleError> {
        if self.file(unit).is_none() {
            return Err(self.unit_not_in_module(unit));
        }

        let Some(existing) = self.entry_point.file else {
            tracing::debug!(module = %self.name_str(), ?unit, ?kind, "entry point registered");
            self.entry_point.file = Some(unit);
            return Ok(());
        };

        let Some(loc) = loc else {
            tracing::trace!(module = %self.name_str(), ?unit, "silent duplicate entry point");
            return Err(self.duplicate_entry_point(existing, None, false, None, None));
        };

        let existing_file = self.file(existing);
        // A script has no main class to point at, so use the start of its
        // buffer.
        let existing_loc = existing_file
            .and_then(|f| f.as_source())
            .and_then(|source| {
                let span = source
                    .main_class_span()
                    .or_else(|| source.buffer_id().map(|_| Span::at_line(1, 1)))?;
                Some((span, source.buffer_id()))
            });
        let cause = if existing_file.is_some_and(|f| f.as_lookup().main_class().is_some()) {
            EntryPointCause::MultipleMainClasses
        } else {
            EntryPointCause::MainClassWithScript
        };
        let first_report = self.entry_point.mark_diagnosed(cause);
        tracing::debug!(
            module = %self.name_str(),
            ?unit,
            ?existing,
            %cause,
            first_report,
            "duplicate entry point"
        );
        Err(self.duplicate_entry_point(
            existing,
            Some(cause),
            first_report,
            Some(loc),
            existing_loc,
        ))
    }

    /// Make `class` the main class of the source file `unit`, registering the
    /// file as the entry point. Registering the same class again succeeds
    /// without effect.
    pub fn register_main_class(
        &mut self,
        decls: &DeclArena,
        unit: UnitId,
        class: DeclId,
        loc: Option<Span>,
    ) -> Result<(), ModuleError> {
        let file = self
            .file(unit)
            .ok_or_else(|| self.unit_not_in_module(unit))?;
        let Some(source) = file.as_source() else {
            return Err(ModuleError::NotASourceFile {
                unit,
                found: file.kind().to_string(),
            });
        };
        if source.main_class() == Some(class) {
            return Ok(());
        }
        debug_assert!(
            decls.get(class).kind == DeclKind::Class,
            "main class must be a class declaration"
        );

        let kind = decls.get(class).artificial_main;
        self.register_entry_point_file(unit, loc, kind)?;
        if let Some(source) = self.file_mut(unit).and_then(|f| f.as_source_mut()) {
            source.set_main_class(class, loc);
        }
        Ok(())
    }

    fn duplicate_entry_point(
        &self,
        existing: UnitId,
        cause: Option<EntryPointCause>,
        first_report: bool,
        span: Option<Span>,
        existing_loc: Option<(Span, Option<u32>)>,
    ) -> ModuleError {
        ModuleError::DuplicateEntryPoint {
            module: self.name_str().to_string(),
            existing,
            cause,
            first_report,
            span: span.map(Into::into),
            existing_span: existing_loc.map(|(span, _)| span.into()),
            existing_buffer: existing_loc.and_then(|(_, buffer)| buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnosed_flags_flip_once() {
        let mut info = EntryPointInfo::default();
        assert!(info.mark_diagnosed_multiple_main_classes());
        assert!(!info.mark_diagnosed_multiple_main_classes());
        assert!(info.mark_diagnosed_main_class_with_script());
        assert!(!info.mark_diagnosed_main_class_with_script());
    }

    #[test]
    fn forget_only_clears_matching_unit() {
        let mut info = EntryPointInfo {
            file: Some(UnitId::new(3)),
            ..Default::default()
        };
        info.forget(UnitId::new(4));
        assert_eq!(info.file(), Some(UnitId::new(3)));
        info.forget(UnitId::new(3));
        assert!(!info.has_entry_point());
    }
}
