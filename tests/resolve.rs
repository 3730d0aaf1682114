// tests/resolve.rs

//! End-to-end resolution scenarios over hand-built catalogs: satisfier
//! selection, transitive expansion, cycles, greedy dependencies, and
//! conflict reporting.

use granary::{
    best_installation_candidate, fetch_conflicts, fetch_unsatisfied, parse_compound,
    parse_deplist, Catalog, Config, DependKind, Package, PkgId, PkgVersion, StateStatus,
    StateWant,
};

fn catalog() -> Catalog {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Catalog::new(Config::default())
}

fn build(name: &str, version: &str) -> Package {
    let mut pkg = Package::new();
    pkg.name = name.to_string();
    pkg.version = PkgVersion::parse(version);
    pkg.architecture = "all".to_string();
    pkg.arch_priority = 1;
    pkg
}

fn add(cat: &mut Catalog, name: &str, version: &str) -> PkgId {
    let pkg = build(name, version);
    cat.insert(pkg, false)
}

fn add_installed(cat: &mut Catalog, name: &str, version: &str) -> PkgId {
    let mut pkg = build(name, version);
    pkg.state_status = StateStatus::Installed;
    pkg.state_want = StateWant::Install;
    cat.insert(pkg, true)
}

fn add_with_depends(cat: &mut Catalog, name: &str, version: &str, depends: &str) -> PkgId {
    let mut pkg = build(name, version);
    let deps = parse_deplist(cat, DependKind::Depend, depends);
    pkg.depends.extend(deps);
    cat.insert(pkg, false)
}

fn names(cat: &Catalog, ids: &[PkgId]) -> Vec<String> {
    ids.iter().map(|&id| cat.pkg(id).name.clone()).collect()
}

#[test]
fn simple_satisfaction() {
    let mut cat = catalog();
    add_installed(&mut cat, "b", "2.1");
    add_installed(&mut cat, "b", "1.0");
    let a = add_with_depends(&mut cat, "a", "1.0", "b (>= 2)");

    let mut unsatisfied = Vec::new();
    let (count, unresolved) = fetch_unsatisfied(&cat, a, &mut unsatisfied, false);
    assert_eq!(count, 0);
    assert!(unresolved.is_empty());

    let compound = parse_compound(&mut cat, DependKind::Depend, "b (>= 2)").unwrap();
    let atom = compound.possibilities[0].clone();
    let apkg = cat.lookup("b").unwrap();
    let best = best_installation_candidate(
        &cat,
        apkg,
        |_, p| p.is_installed() && atom.satisfied_by(p),
        false,
    )
    .unwrap();
    assert_eq!(cat.pkg(best).version.to_string(), "2.1");
}

#[test]
fn virtual_provider_satisfies() {
    let mut cat = catalog();
    let mta = cat.ensure_abstract("mta");
    let mut postfix = build("postfix", "3.0");
    postfix.provides.push(mta);
    postfix.state_status = StateStatus::Installed;
    let postfix = cat.insert(postfix, true);

    let client = add_with_depends(&mut cat, "mail-client", "1.0", "mta");

    let mut unsatisfied = Vec::new();
    let (count, unresolved) = fetch_unsatisfied(&cat, client, &mut unsatisfied, false);
    assert_eq!(count, 0);
    assert!(unresolved.is_empty());

    let mta = cat.lookup("mta").unwrap();
    let best = best_installation_candidate(&cat, mta, |_, _| true, false);
    assert_eq!(best, Some(postfix));
}

#[test]
fn replace_plus_conflict_substitutes_upgrade() {
    let mut cat = catalog();
    add_installed(&mut cat, "old", "1.0");

    let mut new = build("new", "2.0");
    let old_ab = cat.lookup("old").unwrap();
    new.replaces.push(old_ab);
    new.conflicts
        .extend(parse_deplist(&mut cat, DependKind::Conflicts, "old"));
    let new = cat.insert(new, false);

    let new_ab = cat.pkg(new).parent.unwrap();
    assert!(cat.abstract_pkg(old_ab).replaced_by.contains(&new_ab));

    let best = cat.fetch_best("old").unwrap();
    assert_eq!(best, new);
    assert_eq!(cat.pkg(best).version.to_string(), "2.0");
}

#[test]
fn dependency_cycle_terminates() {
    let mut cat = catalog();
    let a = add_with_depends(&mut cat, "a", "1", "b");
    add_with_depends(&mut cat, "b", "1", "a");

    let mut unsatisfied = Vec::new();
    let (count, unresolved) = fetch_unsatisfied(&cat, a, &mut unsatisfied, false);
    assert_eq!(count, 1);
    assert!(unresolved.is_empty());
    assert_eq!(names(&cat, &unsatisfied), vec!["b"]);
}

#[test]
fn greedy_dependence_adds_only_clean_satisfiers() {
    let mut cat = catalog();
    let plugin = cat.ensure_abstract("plugin");

    let mut px = build("plugin-x", "1");
    px.provides.push(plugin);
    cat.insert(px, false);

    let mut py = build("plugin-y", "1");
    py.provides.push(plugin);
    py.depends
        .extend(parse_deplist(&mut cat, DependKind::Depend, "missing"));
    cat.insert(py, false);

    let app = add_with_depends(&mut cat, "app", "1", "plugin *");

    let mut unsatisfied = Vec::new();
    let (count, unresolved) = fetch_unsatisfied(&cat, app, &mut unsatisfied, false);
    assert_eq!(count, 1);
    assert!(unresolved.is_empty());
    assert_eq!(names(&cat, &unsatisfied), vec!["plugin-x"]);
}

#[test]
fn unresolvable_hard_dep_returns_dep_string() {
    let mut cat = catalog();
    let a = add_with_depends(&mut cat, "a", "1", "ghost (>= 1)");

    let mut unsatisfied = Vec::new();
    let (count, unresolved) = fetch_unsatisfied(&cat, a, &mut unsatisfied, false);
    assert_eq!(count, 0);
    assert_eq!(unresolved, vec!["ghost (>= 1)".to_string()]);
}

#[test]
fn version_algebra_spot_checks() {
    let v = PkgVersion::parse("2:1.4.0-r3");
    assert_eq!(v.epoch, 2);
    assert_eq!(v.upstream, "1.4.0");
    assert_eq!(v.revision, "r3");

    assert!(PkgVersion::parse("1:1.0") < PkgVersion::parse("2:0.1"));
    assert!(PkgVersion::parse("1.0-1") < PkgVersion::parse("1.0-2"));
    assert!(PkgVersion::parse("1.0~rc1") < PkgVersion::parse("1.0"));
}

#[test]
fn transitive_chain_orders_dependencies_first() {
    let mut cat = catalog();
    add(&mut cat, "lib2", "1");
    add_with_depends(&mut cat, "lib1", "1", "lib2");
    let app = add_with_depends(&mut cat, "app", "1", "lib1");

    let mut unsatisfied = Vec::new();
    let (count, unresolved) = fetch_unsatisfied(&cat, app, &mut unsatisfied, false);
    assert_eq!(count, 2);
    assert!(unresolved.is_empty());
    assert_eq!(names(&cat, &unsatisfied), vec!["lib2", "lib1"]);
}

#[test]
fn alternatives_fall_through_to_installable() {
    let mut cat = catalog();
    add(&mut cat, "second-choice", "1");
    let app = add_with_depends(&mut cat, "app", "1", "first-choice | second-choice");

    let mut unsatisfied = Vec::new();
    let (count, unresolved) = fetch_unsatisfied(&cat, app, &mut unsatisfied, false);
    assert_eq!(count, 1);
    assert!(unresolved.is_empty());
    assert_eq!(names(&cat, &unsatisfied), vec!["second-choice"]);
}

#[test]
fn selector_picks_highest_arch_priority_across_providers() {
    let mut cat = catalog();
    let virt = cat.ensure_abstract("virt");

    let mut generic = build("virt-generic", "1");
    generic.architecture = "all".to_string();
    generic.arch_priority = 1;
    generic.provides.push(virt);
    cat.insert(generic, false);

    let mut native = build("virt-native", "1");
    native.architecture = "armv7".to_string();
    native.arch_priority = 10;
    native.provides.push(virt);
    let native = cat.insert(native, false);

    let virt = cat.lookup("virt").unwrap();
    // predicate rejects everything: selection falls through to the
    // architecture-priority pass
    let best = best_installation_candidate(&cat, virt, |_, _| false, false);
    assert_eq!(best, Some(native));
}

#[test]
fn quiet_selection_suppresses_priority_fallback() {
    let mut cat = catalog();
    let virt = cat.ensure_abstract("virt");

    let mut generic = build("virt-generic", "1");
    generic.provides.push(virt);
    cat.insert(generic, false);

    let mut native = build("virt-native", "1");
    native.architecture = "armv7".to_string();
    native.arch_priority = 10;
    native.provides.push(virt);
    cat.insert(native, false);

    let virt = cat.lookup("virt").unwrap();
    let best = best_installation_candidate(&cat, virt, |_, _| false, true);
    assert_eq!(best, None);
}

#[test]
fn conflicts_report_installed_collisions() {
    let mut cat = catalog();
    add_installed(&mut cat, "httpd-old", "1.0");
    add(&mut cat, "httpd-old", "2.0");

    let mut new = build("httpd", "2.4");
    new.conflicts
        .extend(parse_deplist(&mut cat, DependKind::Conflicts, "httpd-old"));
    let new = cat.insert(new, false);

    let conflicts = fetch_conflicts(&cat, new);
    assert_eq!(names(&cat, &conflicts), vec!["httpd-old"]);
    assert_eq!(cat.pkg(conflicts[0]).version.to_string(), "1.0");
}

#[test]
fn conflicts_include_install_marked_packages() {
    let mut cat = catalog();
    let marked = add(&mut cat, "rival", "1.0");
    cat.pkg_mut(marked).state_want = StateWant::Install;

    let mut new = build("claimant", "1.0");
    new.conflicts
        .extend(parse_deplist(&mut cat, DependKind::Conflicts, "rival"));
    let new = cat.insert(new, false);

    assert_eq!(fetch_conflicts(&cat, new), vec![marked]);
}

#[test]
fn provider_with_broken_closure_is_filtered() {
    let mut cat = catalog();
    let editor = cat.ensure_abstract("editor");

    let mut good = build("good-editor", "1.0");
    good.provides.push(editor);
    let good = cat.insert(good, false);

    // depends on a name with no providers at all
    let mut broken = build("broken-editor", "9.0");
    broken.provides.push(editor);
    broken
        .depends
        .extend(parse_deplist(&mut cat, DependKind::Depend, "nonexistent"));
    cat.insert(broken, false);

    let editor = cat.lookup("editor").unwrap();
    let best = best_installation_candidate(&cat, editor, |_, _| true, false);
    assert_eq!(best, Some(good));
}
