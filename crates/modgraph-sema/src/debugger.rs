// debugger.rs
//
// Hook that lets an attached debugger (expression evaluator) take part in
// module-level lookup.

use modgraph_identity::{DeclId, DeclName, ModuleId};

use crate::module::LookupKind;

/// A debugger session attached to a module. At most one per module.
pub trait DebuggerClient {
    /// Called after a module-level value lookup has gathered `results`.
    /// The client may add declarations it synthesized or drop shadowed ones.
    fn finish_lookup_in_module(
        &self,
        module: ModuleId,
        name: &DeclName,
        kind: LookupKind,
        results: &mut Vec<DeclId>,
    );
}
