// tests/module_lookup.rs
//! Name lookup through a module's own units.

mod common;

use modgraph::identity::Span;
use modgraph::sema::{
    AccessPath, Decl, DeclId, DeclKind, DeclName, DeclVisibility, DeclWalker, Identifier,
    InterfaceHasher, LoadedFile, LoadedFileKind, LookupKind, ModuleContext, ModuleId,
    ModuleOptions, OperatorFixity, SourceFile, SourceFileKind,
};

use common::warnings_during;

fn lookup(ctx: &ModuleContext, module: ModuleId, path: &AccessPath, name: &DeclName) -> Vec<DeclId> {
    let (module, decls) = ctx.module_and_decls(module).unwrap();
    let mut results = Vec::new();
    module.lookup_value(decls, path, name, LookupKind::Unqualified, &mut results);
    results
}

#[test]
fn overloads_across_files_form_one_set() {
    let mut ctx = ModuleContext::new();
    let m = ctx.create_module("M", ModuleOptions::new());
    let foo = ctx.intern("foo");
    let x = ctx.intern("x");

    let plain = ctx
        .decls_mut()
        .alloc(Decl::new(DeclName::compound(foo, []), DeclKind::Func));
    ctx.add_file(m, SourceFile::new(SourceFileKind::Library, "F.src").with_decls([plain]))
        .unwrap();
    assert_eq!(
        lookup(&ctx, m, &AccessPath::empty(), &DeclName::simple(foo)),
        vec![plain]
    );

    let labelled = ctx
        .decls_mut()
        .alloc(Decl::new(DeclName::compound(foo, [x]), DeclKind::Func));
    ctx.add_file(m, SourceFile::new(SourceFileKind::Library, "G.src").with_decls([labelled]))
        .unwrap();
    let mut found = lookup(&ctx, m, &AccessPath::empty(), &DeclName::simple(foo));
    found.sort();
    assert_eq!(found, vec![plain, labelled]);

    assert_eq!(
        lookup(&ctx, m, &AccessPath::empty(), &DeclName::compound(foo, [x])),
        vec![labelled]
    );
}

#[test]
fn access_path_restricts_to_one_name() {
    let mut ctx = ModuleContext::new();
    let m = ctx.create_module("M", ModuleOptions::new());
    let foo = ctx.intern("foo");
    let bar = ctx.intern("bar");
    let foo_decl = ctx.decls_mut().alloc(Decl::new(foo, DeclKind::Func));
    let bar_decl = ctx.decls_mut().alloc(Decl::new(bar, DeclKind::Var));
    ctx.add_file(
        m,
        SourceFile::new(SourceFileKind::Library, "a.src").with_decls([foo_decl, bar_decl]),
    )
    .unwrap();

    let only_foo = AccessPath::single(foo, Span::default());
    assert_eq!(lookup(&ctx, m, &only_foo, &DeclName::simple(foo)), vec![foo_decl]);
    assert!(lookup(&ctx, m, &only_foo, &DeclName::simple(bar)).is_empty());

    let (module, decls) = ctx.module_and_decls(m).unwrap();
    let mut seen = Vec::new();
    module.lookup_visible_decls(
        decls,
        &only_foo,
        &mut |decl: DeclId, visibility: DeclVisibility| seen.push((decl, visibility)),
        LookupKind::Qualified,
    );
    assert_eq!(seen, vec![(foo_decl, DeclVisibility::TopLevel)]);
}

#[test]
fn new_declarations_wait_for_invalidation() {
    let mut ctx = ModuleContext::new();
    let m = ctx.create_module("M", ModuleOptions::new());
    let unit = ctx
        .add_file(m, SourceFile::new(SourceFileKind::Library, "a.src"))
        .unwrap();
    let late = ctx.intern("late");
    let name = DeclName::simple(late);

    assert!(lookup(&ctx, m, &AccessPath::empty(), &name).is_empty());
    let decl = ctx.push_decl(unit, Decl::new(late, DeclKind::Func)).unwrap();
    assert!(lookup(&ctx, m, &AccessPath::empty(), &name).is_empty());

    ctx.invalidate_lookup_caches(unit).unwrap();
    assert_eq!(lookup(&ctx, m, &AccessPath::empty(), &name), vec![decl]);
}

#[test]
fn builtin_module_resolves_primitives() {
    let mut ctx = ModuleContext::new();
    let builtin = ctx.create_builtin_module();
    let word = ctx.intern("Word");
    let found = lookup(&ctx, builtin, &AccessPath::empty(), &DeclName::simple(word));
    assert_eq!(found.len(), 1);
    let unit = ctx.decls().get(found[0]).owner.unwrap();
    assert_eq!(ctx.owning_module(unit), Some(builtin));
}

#[test]
fn loaded_units_serve_operators_and_groups() {
    let mut ctx = ModuleContext::new();
    let m = ctx.create_module("Ops", ModuleOptions::new());
    let op = ctx.intern("<=>");
    let group = ctx.intern("ComparisonPrecedence");
    let op_decl = ctx.decls_mut().alloc(Decl::new(op, DeclKind::InfixOperator));
    let group_decl = ctx
        .decls_mut()
        .alloc(Decl::new(group, DeclKind::PrecedenceGroup));
    let loaded = LoadedFile::builder(LoadedFileKind::SerializedAst, "Ops.mod")
        .decls([op_decl, group_decl])
        .build(ctx.decls());
    ctx.add_file(m, loaded).unwrap();

    let (module, decls) = ctx.module_and_decls(m).unwrap();
    assert_eq!(
        module.lookup_operator(decls, OperatorFixity::Infix, op),
        Some(op_decl)
    );
    assert_eq!(module.lookup_precedence_group(decls, group), Some(group_decl));
    assert_eq!(module.lookup_precedence_group(decls, Identifier::EMPTY), None);

    let mut groups = Vec::new();
    module.precedence_groups(decls, &mut groups);
    assert_eq!(groups, vec![group_decl]);
}

#[test]
fn conflicting_operators_across_units_warn() {
    let mut ctx = ModuleContext::new();
    let m = ctx.create_module("Ops", ModuleOptions::new());
    let op = ctx.intern("<~>");
    let first = ctx.decls_mut().alloc(Decl::new(op, DeclKind::InfixOperator));
    let second = ctx.decls_mut().alloc(Decl::new(op, DeclKind::InfixOperator));
    ctx.add_file(
        m,
        SourceFile::new(SourceFileKind::Library, "a.src").with_decls([first]),
    )
    .unwrap();
    let loaded = LoadedFile::builder(LoadedFileKind::SerializedAst, "b.mod")
        .decls([second])
        .build(ctx.decls());
    ctx.add_file(m, loaded).unwrap();

    let (module, decls) = ctx.module_and_decls(m).unwrap();
    let log = warnings_during(|| {
        assert_eq!(module.lookup_operator(decls, OperatorFixity::Infix, op), None);
    });
    assert!(log.contains("ambiguous lookup"), "{log}");
    assert!(log.contains("candidates=2"), "{log}");
}

#[derive(Default)]
struct StopAt {
    target: Option<DeclId>,
    visited: Vec<DeclId>,
}

impl DeclWalker for StopAt {
    fn walk_to_decl_post(&mut self, id: DeclId, _decl: &Decl) -> bool {
        self.visited.push(id);
        Some(id) != self.target
    }
}

#[test]
fn walk_reports_abort() {
    let mut ctx = ModuleContext::new();
    let m = ctx.create_module("M", ModuleOptions::new());
    let names: Vec<_> = ["a", "b", "c"].iter().map(|n| ctx.intern(n)).collect();
    let ids: Vec<_> = names
        .iter()
        .map(|&n| ctx.decls_mut().alloc(Decl::new(n, DeclKind::Func)))
        .collect();
    ctx.add_file(
        m,
        SourceFile::new(SourceFileKind::Library, "a.src").with_decls(ids.iter().copied()),
    )
    .unwrap();

    let (module, decls) = ctx.module_and_decls(m).unwrap();
    let mut walker = StopAt::default();
    assert!(!module.walk(decls, &mut walker));
    assert_eq!(walker.visited, ids);

    let mut walker = StopAt {
        target: Some(ids[1]),
        ..Default::default()
    };
    assert!(module.walk(decls, &mut walker));
    assert_eq!(walker.visited, &ids[..2]);
}

#[test]
fn interface_hash_separates_token_boundaries() {
    let mut ctx = ModuleContext::new();
    let m = ctx.create_module("M", ModuleOptions::new());
    let split = ctx
        .add_file(m, SourceFile::new(SourceFileKind::Library, "split.src"))
        .unwrap();
    let joined = ctx
        .add_file(m, SourceFile::new(SourceFileKind::Library, "joined.src"))
        .unwrap();

    let file = ctx.source_file_mut(split).unwrap();
    file.enable_interface_hash().unwrap();
    file.record_interface_token("a");
    file.record_interface_token("b");
    let split_hash = file.take_interface_hash().unwrap();

    let file = ctx.source_file_mut(joined).unwrap();
    file.enable_interface_hash().unwrap();
    file.record_interface_token("ab");
    let joined_hash = file.take_interface_hash().unwrap();

    assert_ne!(split_hash, joined_hash);

    let mut again = InterfaceHasher::new();
    again.record_token("a");
    again.record_token("b");
    assert_eq!(again.finalize(), split_hash);
    assert_eq!(split_hash.to_hex().len(), 64);
}
