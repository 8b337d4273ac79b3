// SPDX-License-Identifier: MPL-2.0

use pkgplan::catalog::{Catalog, OfflineCatalog};
use pkgplan::error::PlanError;
use pkgplan::package::{PackageId, PackageVersion};
use pkgplan::planner::Planner;
use pkgplan::type_aliases::{DependencyConstraints, Set};
use pkgplan::VersionSpec;

use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::Index;
use version_spec::{proptest_spec_strategy, proptest_version_strategy};

/// This generates a random catalog.
/// Package `pN` only depends on packages with a lower index,
/// so that dependencies never form a cycle.
fn catalog_strategy() -> impl Strategy<Value = OfflineCatalog> {
    let max_packages = 6;
    let max_versions = 4;
    let max_deps = 2;

    let dependency = (any::<Index>(), proptest_spec_strategy());
    let release = (proptest_version_strategy(), vec(dependency, 0..=max_deps));
    let package = vec(release, 1..=max_versions);
    vec(package, 1..=max_packages).prop_map(|packages| {
        let mut catalog = OfflineCatalog::new();
        for (index, releases) in packages.into_iter().enumerate() {
            for (version, deps) in releases {
                let dependencies: DependencyConstraints = if index == 0 {
                    DependencyConstraints::default()
                } else {
                    deps.into_iter()
                        .map(|(dep, spec)| (format!("p{}", dep.index(index)), spec))
                        .collect()
                };
                catalog.insert(PackageVersion::with_constraints(
                    PackageId::new(format!("p{}", index), version),
                    dependencies,
                ));
            }
        }
        catalog
    })
}

fn last_package(catalog: &OfflineCatalog) -> String {
    format!("p{}", catalog.packages().count() - 1)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128, .. ProptestConfig::default()
    })]

    #[test]
    fn installed_plans_are_consistent(catalog in catalog_strategy()) {
        let installed = OfflineCatalog::new();
        let planner = Planner::repository(&catalog, &installed);
        match planner.install_plan(&[last_package(&catalog)], &["*"]) {
            Ok(plan) => {
                prop_assert!(planner.list_missing_dependencies(&plan).is_empty());
                prop_assert!(plan.remove_list().is_empty());
                let mut seen = Set::default();
                for entry in plan.add_list() {
                    prop_assert!(catalog.contains(entry.id()));
                    prop_assert!(seen.insert(entry.id().clone()));
                }
            }
            Err(PlanError::Resolution { messages }) => prop_assert!(!messages.is_empty()),
            Err(err) => prop_assert!(false, "unexpected error {:?}", err),
        }
    }

    #[test]
    fn project_plans_hold_one_version_per_package(catalog in catalog_strategy()) {
        let installed = OfflineCatalog::new();
        let planner = Planner::project(&catalog, &installed);
        if let Ok(plan) = planner.install_plan(&[last_package(&catalog)], &["*"]) {
            prop_assert!(planner.list_missing_dependencies(&plan).is_empty());
            let mut names = Set::default();
            for entry in plan.add_list() {
                prop_assert!(names.insert(entry.name().to_string()));
            }
        }
    }

    #[test]
    fn same_result_on_repeated_runs(catalog in catalog_strategy()) {
        let installed = OfflineCatalog::new();
        let planner = Planner::project(&catalog, &installed);
        let name = last_package(&catalog);
        prop_assert_eq!(
            planner.install_plan(&[name.as_str()], &["*"]),
            planner.install_plan(&[name.as_str()], &["*"])
        );
    }

    #[test]
    fn installing_a_plan_then_removing_it_is_consistent(catalog in catalog_strategy()) {
        let empty = OfflineCatalog::new();
        let name = last_package(&catalog);
        let Ok(plan) = Planner::repository(&catalog, &empty).install_plan(&[name.as_str()], &["*"]) else {
            return Ok(());
        };
        let installed: OfflineCatalog = plan.add_list().iter().cloned().collect();
        let planner = Planner::repository(&catalog, &installed);

        // Everything the plan added is already there.
        prop_assert!(planner.install_plan(&[name.as_str()], &["*"]).unwrap().is_empty());

        // Removing everything never leaves a dependency behind.
        let names: Vec<&str> = installed.packages().collect();
        let removal = planner.remove_plan(&names, &["*"]);
        if installed.len() == names.len() {
            prop_assert!(removal.is_ok());
        }
    }

    #[test]
    fn requests_never_match_more_than_specs(
        version in proptest_version_strategy(),
        components in 1usize..=3,
        other in proptest_version_strategy()
    ) {
        let full = version.to_string();
        let request = full.split('.').take(components).collect::<Vec<_>>().join(".");
        let narrowed = pkgplan::install_spec_from_request(&request);
        let spec = VersionSpec::parse(&request);
        if components == 3 {
            prop_assert_eq!(narrowed, VersionSpec::exact(version));
        }
        prop_assert!(narrowed.contains(&version));
        if narrowed.contains(&other) {
            prop_assert!(spec.contains(&other));
        }
    }
}
