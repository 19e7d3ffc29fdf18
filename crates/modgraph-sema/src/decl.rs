// decl.rs
//
// Declarations as produced by the parser or a loader, and the session-wide
// arena that owns them. DeclIds are indices into the arena.

use modgraph_identity::{DeclId, DeclName, Identifier, Span, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Func,
    Var,
    Struct,
    Class,
    Enum,
    Protocol,
    TypeAlias,
    Extension,
    InfixOperator,
    PrefixOperator,
    PostfixOperator,
    PrecedenceGroup,
    TopLevelCode,
}

impl DeclKind {
    /// Declarations that name a value or type and participate in value lookup
    pub fn is_value(self) -> bool {
        matches!(
            self,
            DeclKind::Func
                | DeclKind::Var
                | DeclKind::Struct
                | DeclKind::Class
                | DeclKind::Enum
                | DeclKind::Protocol
                | DeclKind::TypeAlias
        )
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            DeclKind::Struct
                | DeclKind::Class
                | DeclKind::Enum
                | DeclKind::Protocol
                | DeclKind::TypeAlias
        )
    }

    pub fn operator_fixity(self) -> Option<OperatorFixity> {
        match self {
            DeclKind::InfixOperator => Some(OperatorFixity::Infix),
            DeclKind::PrefixOperator => Some(OperatorFixity::Prefix),
            DeclKind::PostfixOperator => Some(OperatorFixity::Postfix),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeclKind::Func => "func",
            DeclKind::Var => "var",
            DeclKind::Struct => "struct",
            DeclKind::Class => "class",
            DeclKind::Enum => "enum",
            DeclKind::Protocol => "protocol",
            DeclKind::TypeAlias => "typealias",
            DeclKind::Extension => "extension",
            DeclKind::InfixOperator => "infix operator",
            DeclKind::PrefixOperator => "prefix operator",
            DeclKind::PostfixOperator => "postfix operator",
            DeclKind::PrecedenceGroup => "precedencegroup",
            DeclKind::TopLevelCode => "top-level code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFixity {
    Infix,
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AccessLevel {
    Private,
    FilePrivate,
    #[default]
    Internal,
    Public,
    Open,
}

impl AccessLevel {
    /// Private and fileprivate declarations need a per-file discriminator
    pub fn is_file_scoped(self) -> bool {
        matches!(self, AccessLevel::Private | AccessLevel::FilePrivate)
    }
}

/// Attribute that turns a class into the program's entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtificialMainKind {
    UiApplicationMain,
    NsApplicationMain,
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub name: DeclName,
    pub kind: DeclKind,
    pub access: AccessLevel,
    pub span: Span,
    /// Unit that owns this declaration. Set when the unit joins a module.
    pub owner: Option<UnitId>,
    /// Member declarations of a nominal type or extension
    pub members: Vec<DeclId>,
    /// Selector under which a method is reachable through dynamic dispatch
    pub selector: Option<Identifier>,
    /// Mangled name of a type declared inside a function body
    pub local_mangled_name: Option<String>,
    pub artificial_main: Option<ArtificialMainKind>,
}

impl Decl {
    pub fn new(name: impl Into<DeclName>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            access: AccessLevel::default(),
            span: Span::default(),
            owner: None,
            members: Vec::new(),
            selector: None,
            local_mangled_name: None,
            artificial_main: None,
        }
    }

    pub fn with_access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_members(mut self, members: impl IntoIterator<Item = DeclId>) -> Self {
        self.members.extend(members);
        self
    }

    pub fn with_selector(mut self, selector: Identifier) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_local_mangled_name(mut self, mangled: impl Into<String>) -> Self {
        self.local_mangled_name = Some(mangled.into());
        self
    }

    pub fn with_artificial_main(mut self, kind: ArtificialMainKind) -> Self {
        self.artificial_main = Some(kind);
        self
    }

    pub fn base_name(&self) -> Identifier {
        self.name.base()
    }
}

/// Owns every declaration of a session.
#[derive(Debug, Clone, Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        let id = DeclId::new(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.index() as usize]
    }

    pub fn try_get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.index() as usize)
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index() as usize]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Record `owner` on `id` and, recursively, on its members.
    pub(crate) fn set_owner(&mut self, id: DeclId, owner: UnitId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let decl = self.get_mut(next);
            decl.owner = Some(owner);
            stack.extend(decl.members.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgraph_identity::Interner;

    #[test]
    fn alloc_and_owner_propagation() {
        let mut interner = Interner::new();
        let mut arena = DeclArena::new();
        let method = arena.alloc(Decl::new(interner.intern("run"), DeclKind::Func));
        let class = arena.alloc(
            Decl::new(interner.intern("App"), DeclKind::Class).with_members([method]),
        );

        arena.set_owner(class, UnitId::new(7));
        assert_eq!(arena.get(class).owner, Some(UnitId::new(7)));
        assert_eq!(arena.get(method).owner, Some(UnitId::new(7)));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn value_kinds() {
        assert!(DeclKind::Func.is_value());
        assert!(DeclKind::Class.is_type());
        assert!(!DeclKind::InfixOperator.is_value());
        assert_eq!(
            DeclKind::PostfixOperator.operator_fixity(),
            Some(OperatorFixity::Postfix)
        );
        assert!(AccessLevel::FilePrivate.is_file_scoped());
        assert!(!AccessLevel::Public.is_file_scoped());
    }
}
