// SPDX-License-Identifier: MPL-2.0

use pkgplan::catalog::OfflineCatalog;
use pkgplan::error::PlanError;
use pkgplan::package::PackageId;
use pkgplan::planner::Planner;
use pkgplan::VersionSpec;

type Entry<'a> = (&'a str, &'a str, &'a [(&'a str, &'a str)]);

fn catalog(entries: &[Entry]) -> OfflineCatalog {
    let mut catalog = OfflineCatalog::new();
    for (name, version, dependencies) in entries {
        catalog.add_version(*name, *version, dependencies.iter().copied());
    }
    catalog
}

fn id(name: &str, version: &str) -> PackageId {
    PackageId::new(name, version)
}

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn source() -> OfflineCatalog {
    catalog(&[
        ("a", "1.0.0", &[]),
        ("a", "1.1.0", &[("b", "*")]),
        ("b", "1.0.0", &[]),
    ])
}

#[test]
fn install_pulls_dependencies() {
    init_log();
    let source = source();
    let installed = OfflineCatalog::new();
    let plan = Planner::repository(&source, &installed)
        .install_plan(&["a"], &["1.1.0!"])
        .unwrap();

    assert!(plan.is_on_add_list(&id("a", "1.1.0")));
    assert!(plan.is_on_add_list(&id("b", "1.0.0")));
    assert_eq!(plan.add_list().len(), 2);
    assert!(plan.remove_list().is_empty());
}

#[test]
fn project_install_conflicts_with_installed_version() {
    init_log();
    let source = source();
    let installed = catalog(&[("a", "1.0.0", &[])]);
    let planner = Planner::project(&source, &installed);

    match planner.install_plan(&["a"], &["1.1.0!"]) {
        Err(PlanError::Resolution { messages }) => {
            assert!(messages
                .iter()
                .any(|m| m.contains("a@1.1.0 conflicts with installed a@1.0.0")));
        }
        other => panic!("expected a resolution error, got {:?}", other),
    }
}

#[test]
fn project_upgrade_replaces_installed_version() {
    init_log();
    let source = source();
    let installed = catalog(&[("a", "1.0.0", &[])]);
    let plan = Planner::project(&source, &installed)
        .upgrade_plan(&["a"], &["1.1.0!"])
        .unwrap();

    assert!(plan.is_on_remove_list(&id("a", "1.0.0")));
    assert_eq!(plan.remove_list().len(), 1);
    assert!(plan.is_on_add_list(&id("a", "1.1.0")));
    assert!(plan.is_on_add_list(&id("b", "1.0.0")));
}

#[test]
fn repository_install_keeps_other_versions() {
    init_log();
    let source = source();
    let installed = catalog(&[("a", "1.0.0", &[])]);
    let plan = Planner::repository(&source, &installed)
        .install_plan(&["a"], &["1.1.0!"])
        .unwrap();

    assert!(plan.is_on_add_list(&id("a", "1.1.0")));
    assert!(plan.remove_list().is_empty());
}

#[test]
fn remove_with_dependents_fails() {
    init_log();
    let source = source();
    let installed = catalog(&[("a", "1.1.0", &[("b", "*")]), ("b", "1.0.0", &[])]);
    let planner = Planner::repository(&source, &installed);

    assert_eq!(
        planner.remove_plan(&["b"], &["*"]),
        Err(PlanError::HasDependents {
            missing: vec![("b".to_string(), VersionSpec::any())]
        })
    );

    let plan = planner.remove_plan(&["a", "b"], &["*"]).unwrap();
    assert!(plan.is_on_remove_list(&id("a", "1.1.0")));
    assert!(plan.is_on_remove_list(&id("b", "1.0.0")));

    let forced = planner.without_dependencies().remove_plan(&["b"], &["*"]);
    assert!(forced.unwrap().is_on_remove_list(&id("b", "1.0.0")));
}

#[test]
fn remove_picks_requested_version() {
    init_log();
    let source = OfflineCatalog::new();
    let installed = catalog(&[("a", "1.0.0", &[]), ("a", "1.1.0", &[])]);
    let planner = Planner::repository(&source, &installed);

    let plan = planner.remove_plan(&["a"], &["1.0.0!"]).unwrap();
    assert_eq!(plan.remove_list().len(), 1);
    assert!(plan.is_on_remove_list(&id("a", "1.0.0")));

    let plan = planner.remove_plan(&["a"], &["1"]).unwrap();
    assert!(plan.is_on_remove_list(&id("a", "1.1.0")));
}

#[test]
fn same_result_on_repeated_runs() {
    init_log();
    let source = catalog(&[
        ("a", "1.0.0", &[("b", "*"), ("c", "*")]),
        ("b", "1.0.0", &[]),
        ("b", "1.1.0", &[("c", "1.0-1.0")]),
        ("c", "1.0.0", &[]),
        ("c", "2.0.0", &[]),
    ]);
    let installed = OfflineCatalog::new();
    let planner = Planner::project(&source, &installed);

    let one = planner.install_plan(&["a"], &["*"]);
    for _ in 0..10 {
        match (&one, &planner.install_plan(&["a"], &["*"])) {
            (Ok(l), Ok(r)) => assert_eq!(l, r),
            _ => panic!("not the same result"),
        }
    }
}

#[test]
fn install_prefers_newest_compatible_version() {
    init_log();
    let source = catalog(&[
        ("a", "1.0.0", &[("b", "1")]),
        ("b", "1.0.0", &[]),
        ("b", "1.1.0", &[]),
        ("b", "2.0.0", &[]),
    ]);
    let installed = OfflineCatalog::new();
    let plan = Planner::project(&source, &installed)
        .install_plan(&["a"], &["1"])
        .unwrap();

    assert_eq!(
        plan.package_on_add_list("b").map(|entry| entry.id().clone()),
        Some(id("b", "1.1.0"))
    );
}

#[test]
fn requested_minor_version_is_locked() {
    init_log();
    let source = catalog(&[("a", "1.2.0", &[]), ("a", "1.2.4", &[]), ("a", "1.3.0", &[])]);
    let installed = OfflineCatalog::new();
    let plan = Planner::project(&source, &installed)
        .install_plan(&["a"], &["1.2"])
        .unwrap();

    assert!(plan.is_on_add_list(&id("a", "1.2.4")));
}

#[test]
fn project_install_backtracks_on_conflict() {
    init_log();
    let source = catalog(&[
        ("a", "1.0.0", &[("b", "*"), ("c", "1")]),
        ("b", "1.0.0", &[("c", "1")]),
        ("b", "2.0.0", &[("c", "2")]),
        ("c", "1.0.0", &[]),
        ("c", "2.0.0", &[]),
    ]);
    let installed = OfflineCatalog::new();

    let plan = Planner::project(&source, &installed)
        .install_plan(&["a"], &["*"])
        .unwrap();
    assert!(plan.is_on_add_list(&id("b", "1.0.0")));
    assert!(plan.is_on_add_list(&id("c", "1.0.0")));
    assert_eq!(plan.add_list().len(), 3);

    // A repository accepts both versions of c, so the newest b is kept.
    let plan = Planner::repository(&source, &installed)
        .install_plan(&["a"], &["*"])
        .unwrap();
    assert!(plan.is_on_add_list(&id("b", "2.0.0")));
    assert!(plan.is_on_add_list(&id("c", "1.0.0")));
    assert!(plan.is_on_add_list(&id("c", "2.0.0")));
}

#[test]
fn installed_dependencies_are_reused() {
    init_log();
    let source = source();
    let installed = catalog(&[("b", "1.0.0", &[])]);
    let plan = Planner::project(&source, &installed)
        .install_plan(&["a"], &["1.1"])
        .unwrap();

    assert_eq!(plan.add_list().len(), 1);
    assert!(plan.is_on_add_list(&id("a", "1.1.0")));
}

#[test]
fn installing_installed_version_changes_nothing() {
    init_log();
    let source = source();
    let installed = catalog(&[("a", "1.1.0", &[("b", "*")]), ("b", "1.0.0", &[])]);
    let plan = Planner::project(&source, &installed)
        .install_plan(&["a"], &["1"])
        .unwrap();

    assert!(plan.is_empty());
}

#[test]
fn missing_dependency_is_reported() {
    init_log();
    let source = catalog(&[("a", "1.0.0", &[("b", "3")]), ("b", "1.0.0", &[])]);
    let installed = OfflineCatalog::new();

    match Planner::repository(&source, &installed).install_plan(&["a"], &["*"]) {
        Err(PlanError::Resolution { messages }) => {
            assert_eq!(
                messages,
                vec!["unknown package version b 3 (required by a@1.0.0)".to_string()]
            );
        }
        other => panic!("expected a resolution error, got {:?}", other),
    }
}

#[test]
fn repository_upgrade_picks_newest() {
    init_log();
    let source = catalog(&[("a", "1.0.0", &[]), ("a", "1.1.0", &[]), ("a", "1.2.0", &[])]);
    let installed = catalog(&[("a", "1.0.0", &[])]);
    let plan = Planner::repository(&source, &installed)
        .upgrade_plan(&["a"], &["1"])
        .unwrap();

    assert!(plan.is_on_remove_list(&id("a", "1.0.0")));
    assert!(plan.is_on_add_list(&id("a", "1.2.0")));
    assert_eq!(plan.add_list().len(), 1);
}

#[test]
fn upgrade_without_newer_version_changes_nothing() {
    init_log();
    let source = catalog(&[("a", "1.0.0", &[]), ("a", "1.1.0", &[])]);
    let installed = catalog(&[("a", "1.1.0", &[])]);
    let plan = Planner::project(&source, &installed)
        .upgrade_plan(&["a"], &["1"])
        .unwrap();

    assert!(plan.is_empty());
}

#[test]
fn upgrade_carries_dependencies_along() {
    init_log();
    let source = catalog(&[
        ("a", "1.0.0", &[("b", "1")]),
        ("a", "2.0.0", &[("b", "2")]),
        ("b", "1.0.0", &[]),
        ("b", "2.0.0", &[]),
    ]);
    let installed = catalog(&[("a", "1.0.0", &[("b", "1")]), ("b", "1.0.0", &[])]);
    let plan = Planner::project(&source, &installed)
        .upgrade_plan(&["a"], &["2"])
        .unwrap();

    assert!(plan.is_on_remove_list(&id("a", "1.0.0")));
    assert!(plan.is_on_remove_list(&id("b", "1.0.0")));
    assert!(plan.is_on_add_list(&id("a", "2.0.0")));
    assert!(plan.is_on_add_list(&id("b", "2.0.0")));
}

#[test]
fn upgrade_breaking_other_packages_fails() {
    init_log();
    let source = catalog(&[
        ("a", "1.0.0", &[("b", "1")]),
        ("a", "2.0.0", &[("b", "2")]),
        ("b", "1.0.0", &[]),
        ("b", "2.0.0", &[]),
    ]);
    let installed = catalog(&[
        ("a", "1.0.0", &[("b", "1")]),
        ("b", "1.0.0", &[]),
        ("c", "1.0.0", &[("b", "1")]),
    ]);

    assert_eq!(
        Planner::project(&source, &installed).upgrade_plan(&["a"], &["2"]),
        Err(PlanError::HasDependents {
            missing: vec![("b".to_string(), VersionSpec::parse("1"))]
        })
    );
}

#[test]
fn upgrade_substitutes_planned_dependency() {
    init_log();
    let source = catalog(&[
        ("a", "1.0.0", &[("c", "1")]),
        ("a", "2.0.0", &[("c", "1.1+")]),
        ("b", "1.0.0", &[("c", "1")]),
        ("b", "2.0.0", &[("c", "1.0-1.2")]),
        ("c", "1.0.0", &[]),
        ("c", "1.2.0", &[]),
        ("c", "1.5.0", &[]),
    ]);
    let installed = catalog(&[
        ("a", "1.0.0", &[("c", "1")]),
        ("b", "1.0.0", &[("c", "1")]),
        ("c", "1.0.0", &[]),
    ]);
    let plan = Planner::project(&source, &installed)
        .upgrade_plan(&["a", "b"], &["2"])
        .unwrap();

    // c 1.5.0 was planned for a, then swapped for a version b also accepts.
    assert!(plan.was_substituted(&id("c", "1.5.0")));
    assert!(!plan.is_on_add_list(&id("c", "1.5.0")));
    assert!(plan.is_on_add_list(&id("c", "1.2.0")));
    assert!(plan.is_on_add_list(&id("a", "2.0.0")));
    assert!(plan.is_on_add_list(&id("b", "2.0.0")));
    assert!(plan.is_on_remove_list(&id("c", "1.0.0")));
    assert_eq!(plan.remove_list().len(), 3);
}

#[test]
fn upgrade_falls_back_to_plan_keeping_dependents() {
    init_log();
    let source = catalog(&[
        ("a", "1.0.0", &[("b", "1")]),
        ("a", "1.5.0", &[("b", "1")]),
        ("a", "2.0.0", &[("b", "2")]),
        ("b", "1.0.0", &[]),
        ("b", "2.0.0", &[]),
    ]);
    let installed = catalog(&[
        ("a", "1.0.0", &[("b", "1")]),
        ("b", "1.0.0", &[]),
        ("c", "1.0.0", &[("b", "1")]),
    ]);
    let plan = Planner::project(&source, &installed)
        .upgrade_plan(&["a"], &["1+"])
        .unwrap();

    // a 2.0.0 would take b 1.0.0 away from c.
    assert_eq!(plan.remove_list().len(), 1);
    assert!(plan.is_on_remove_list(&id("a", "1.0.0")));
    assert_eq!(plan.add_list().len(), 1);
    assert!(plan.is_on_add_list(&id("a", "1.5.0")));
    assert!(plan.replaced_list().is_empty());
}
