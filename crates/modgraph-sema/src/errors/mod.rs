// errors/mod.rs
//! Module engine errors (E3xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::{Diagnostic, SourceSpan};
use modgraph_identity::{ModuleId, UnitId};
use thiserror::Error;

use crate::module::EntryPointCause;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("debugger client already set for module '{module}'")]
    #[diagnostic(code(E3001))]
    DebugClientAlreadySet { module: String },

    #[error("module '{module}' already has an entry point")]
    #[diagnostic(code(E3002))]
    DuplicateEntryPoint {
        module: String,
        /// File that was registered first
        existing: UnitId,
        /// Why the new registration conflicts; `None` when the caller gave no
        /// location and no diagnostic is expected
        cause: Option<EntryPointCause>,
        /// True only the first time this cause is reported for the module
        first_report: bool,
        #[label("entry point declared here")]
        span: Option<SourceSpan>,
        #[label("previous entry point")]
        existing_span: Option<SourceSpan>,
        /// Source buffer `existing_span` points into
        existing_buffer: Option<u32>,
    },

    #[error("unit {unit:?} is not part of module '{module}'")]
    #[diagnostic(code(E3003))]
    UnitNotInModule { module: String, unit: UnitId },

    #[error("module handle {0:?} does not refer to a live module")]
    #[diagnostic(code(E3004))]
    UnknownModule(ModuleId),

    #[error("interface hash already enabled for '{filename}'")]
    #[diagnostic(code(E3005))]
    InterfaceHashAlreadyEnabled { filename: String },

    #[error("an import cannot be both exported and implementation-only")]
    #[diagnostic(code(E3006))]
    ConflictingImportOptions {
        #[label("conflicting import")]
        span: Option<SourceSpan>,
    },

    #[error("private declaration already recorded as coming from '{existing}', not '{requested}'")]
    #[diagnostic(code(E3007))]
    ConflictingPrivateFilename { existing: String, requested: String },

    #[error("module '{module}' has no units")]
    #[diagnostic(code(E3008))]
    NoFiles { module: String },

    #[error("main unit of module '{module}' is {found}, expected {expected}")]
    #[diagnostic(code(E3009))]
    MainFileKindMismatch {
        module: String,
        expected: String,
        found: String,
    },

    #[error("unit {unit:?} is a {found}, not a source file")]
    #[diagnostic(code(E3010))]
    NotASourceFile { unit: UnitId, found: String },

    #[error("unit handle {0:?} does not belong to any live module")]
    #[diagnostic(code(E3011))]
    UnknownUnit(UnitId),
}

impl ModuleError {
    /// Whether a caller that emits diagnostics should report this error.
    ///
    /// Entry-point conflicts are only worth one diagnostic per distinct cause.
    pub fn should_report(&self) -> bool {
        match self {
            ModuleError::DuplicateEntryPoint {
                cause, first_report, ..
            } => cause.is_some() && *first_report,
            _ => true,
        }
    }
}
