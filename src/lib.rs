// src/lib.rs
pub mod logging;

pub use modgraph_identity as identity;
pub use modgraph_sema as sema;

pub use logging::init_tracing;
pub use modgraph_sema::{
    AccessPath, DeclId, DeclName, Identifier, ModuleContext, ModuleError, ModuleId, UnitId,
};
