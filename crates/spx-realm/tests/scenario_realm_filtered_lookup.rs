//! Realm-filtered lookup over a realm registry.
//!
//! GREEN when:
//! - Outside any context realm, every bean is returned.
//! - Inside a realm, realm-scoped beans from invisible realms are dropped.
//! - Static beans are always returned.
//! - Each `iter()` call re-reads the context realm.
//! - Output order matches input order.

use spx_realm::{
    enter_realm, BeanEntry, BeanSource, RealmFilteredBeans, RealmId, RealmRegistry, RealmSpec,
};

fn registry() -> RealmRegistry {
    let mut reg = RealmRegistry::new();
    reg.insert(RealmSpec::new("plexus.core")).unwrap();
    reg.insert(RealmSpec::new("extension.a")).unwrap();
    reg.insert(
        RealmSpec::new("project")
            .with_parent("plexus.core")
            .with_import("extension.a"),
    )
    .unwrap();
    reg.insert(RealmSpec::new("other.project").with_parent("plexus.core"))
        .unwrap();
    reg.validate().unwrap();
    reg
}

fn beans() -> Vec<BeanEntry<&'static str>> {
    vec![
        BeanEntry::new("default", "Static", "static-default"),
        BeanEntry::new("core", "ClassRealm:plexus.core", "core-impl"),
        BeanEntry::new("ext", "ClassRealm[extension.a, parent: null]", "ext-impl"),
        BeanEntry::new("mine", BeanSource::realm("project"), "project-impl"),
        BeanEntry::new("theirs", BeanSource::realm("other.project"), "other-impl"),
        BeanEntry::new("late", "Static2", "static-late"),
    ]
}

fn names<'a>(itr: impl Iterator<Item = &'a BeanEntry<&'static str>>) -> Vec<&'a str> {
    itr.map(|b| b.name.as_str()).collect()
}

#[test]
fn no_context_realm_returns_everything() {
    let reg = registry();
    let all = beans();
    let view = RealmFilteredBeans::new(all.iter(), &reg);

    assert_eq!(
        names(view.iter()),
        ["default", "core", "ext", "mine", "theirs", "late"]
    );
}

#[test]
fn project_realm_sees_imports_and_parent_only() {
    let reg = registry();
    let all = beans();
    let view = RealmFilteredBeans::new(all.iter(), &reg);

    let _g = enter_realm(RealmId::new("project"));
    assert_eq!(
        names(view.iter()),
        ["default", "core", "ext", "mine", "late"]
    );
}

#[test]
fn sibling_project_does_not_see_project_beans() {
    let reg = registry();
    let all = beans();
    let view = RealmFilteredBeans::new(all.iter(), &reg);

    let _g = enter_realm(RealmId::new("other.project"));
    assert_eq!(names(view.iter()), ["default", "core", "theirs", "late"]);
}

#[test]
fn unknown_context_realm_disables_filtering() {
    let reg = registry();
    let all = beans();
    let view = RealmFilteredBeans::new(all.iter(), &reg);

    let _g = enter_realm(RealmId::new("not.registered"));
    let itr = view.iter();
    assert!(!itr.is_filtering());
    assert_eq!(names(itr).len(), 6);
}

#[test]
fn each_pass_reads_the_current_context() {
    let reg = registry();
    let all = beans();
    let view = RealmFilteredBeans::new(all.iter(), &reg);

    let in_project = {
        let _g = enter_realm(RealmId::new("project"));
        view.iter()
    };
    let outside = view.iter();

    // The first pass keeps the visibility it resolved when it started.
    assert_eq!(
        names(in_project),
        ["default", "core", "ext", "mine", "late"]
    );
    assert_eq!(names(outside).len(), 6);
}

#[test]
fn for_loop_over_view_reference() {
    let reg = registry();
    let all = beans();
    let view = RealmFilteredBeans::new(&all, &reg);

    let _g = enter_realm(RealmId::new("plexus.core"));
    let mut values = Vec::new();
    for bean in &view {
        values.push(bean.value);
    }
    assert_eq!(values, ["static-default", "core-impl", "static-late"]);
}
