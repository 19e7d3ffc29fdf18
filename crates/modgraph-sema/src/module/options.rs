// module/options.rs
//
// Per-module configuration applied at creation, and the flag word a module
// keeps for the rest of the session.

use crate::option_set::define_option_set;

/// How a module's types and function bodies are treated for ABI purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ResilienceStrategy {
    /// Fragile: clients may depend on layout and inline bodies
    #[default]
    Default,
    /// Library evolution: non-public layout and bodies are opaque to clients
    Resilient,
}

define_option_set! {
    /// Boolean state of a module
    pub struct ModuleFlags: u8 {
        const TESTING = 1 << 0;
        const IMPLICIT_DYNAMIC = 1 << 1;
        const PRIVATE_IMPORTS = 1 << 2;
        /// Sticky: the module stays queryable but answers nothing
        const FAILED_TO_LOAD = 1 << 3;
        /// Name binding finished; import queries can be trusted
        const RESOLVED_IMPORTS = 1 << 4;
        const SYSTEM = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModuleOptions {
    pub resilience: ResilienceStrategy,
    pub testing: bool,
    pub implicit_dynamic: bool,
    pub private_imports: bool,
    pub system: bool,
}

impl ModuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resilience(mut self, resilience: ResilienceStrategy) -> Self {
        self.resilience = resilience;
        self
    }

    pub fn with_testing(mut self, enabled: bool) -> Self {
        self.testing = enabled;
        self
    }

    pub fn with_implicit_dynamic(mut self, enabled: bool) -> Self {
        self.implicit_dynamic = enabled;
        self
    }

    pub fn with_private_imports(mut self, enabled: bool) -> Self {
        self.private_imports = enabled;
        self
    }

    pub fn with_system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    pub(crate) fn flags(&self) -> ModuleFlags {
        let mut flags = ModuleFlags::empty();
        flags.set(ModuleFlags::TESTING, self.testing);
        flags.set(ModuleFlags::IMPLICIT_DYNAMIC, self.implicit_dynamic);
        flags.set(ModuleFlags::PRIVATE_IMPORTS, self.private_imports);
        flags.set(ModuleFlags::SYSTEM, self.system);
        flags
    }
}
