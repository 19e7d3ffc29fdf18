//! Query point into the external conformance solver.
//!
//! The module engine does not decide conformance itself. It asks the
//! solver for a conformance of a type to a protocol and then makes sure each
//! conditional requirement of that conformance holds, asking the solver
//! again for each one.

use modgraph_identity::{DeclId, ModuleId, TypeRef};

/// `ty: protocol`, a requirement a conditional conformance depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConformanceRequirement {
    pub ty: TypeRef,
    pub protocol: DeclId,
}

/// What the solver found for a (type, protocol) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolConformance {
    /// The type is a generic parameter or existential constrained to the
    /// protocol; conformance is known abstractly
    Abstract,
    /// A concrete conformance declaration, possibly conditional
    Concrete {
        conditional_requirements: Vec<ConformanceRequirement>,
    },
}

/// A resolved conformance, returned only when every conditional requirement
/// is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConformanceRef {
    Abstract { protocol: DeclId },
    Concrete { ty: TypeRef, protocol: DeclId },
}

impl ConformanceRef {
    pub fn protocol(&self) -> DeclId {
        match self {
            ConformanceRef::Abstract { protocol } | ConformanceRef::Concrete { protocol, .. } => {
                *protocol
            }
        }
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, ConformanceRef::Concrete { .. })
    }
}

/// The type checker's conformance lookup, seen from a module.
pub trait ConformanceSolver {
    fn lookup_conformance(
        &self,
        module: ModuleId,
        ty: TypeRef,
        protocol: DeclId,
    ) -> Option<ProtocolConformance>;
}

/// Returns a conformance iff the solver finds one and all of its conditional
/// requirements hold. Requirement chains deeper than `max_depth` are treated
/// as unsatisfied.
pub(crate) fn conforms_to_protocol(
    solver: &dyn ConformanceSolver,
    module: ModuleId,
    ty: TypeRef,
    protocol: DeclId,
    max_depth: usize,
) -> Option<ConformanceRef> {
    check(solver, module, ty, protocol, max_depth)
}

fn check(
    solver: &dyn ConformanceSolver,
    module: ModuleId,
    ty: TypeRef,
    protocol: DeclId,
    depth: usize,
) -> Option<ConformanceRef> {
    let conformance = solver.lookup_conformance(module, ty, protocol)?;
    match conformance {
        ProtocolConformance::Abstract => Some(ConformanceRef::Abstract { protocol }),
        ProtocolConformance::Concrete {
            conditional_requirements,
        } => {
            if !conditional_requirements.is_empty() && depth == 0 {
                tracing::warn!(?ty, ?protocol, "conditional conformance too deeply nested");
                return None;
            }
            let satisfied = conditional_requirements
                .iter()
                .all(|req| check(solver, module, req.ty, req.protocol, depth - 1).is_some());
            satisfied.then_some(ConformanceRef::Concrete { ty, protocol })
        }
    }
}
