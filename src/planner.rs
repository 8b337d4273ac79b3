// SPDX-License-Identifier: MPL-2.0

//! Planning package installs, removals and upgrades.
//!
//! The planner works on two catalogs: the source catalog listing every version
//! that could be installed, and the installed catalog listing what is present.
//! Each request produces a [Plan] telling which package versions
//! to add and which to remove, such that every dependency of every package
//! left installed is satisfied.
//!
//! ## Search
//!
//! Resolution is a backtracking search over a worklist of candidate plans.
//! A plan with no pending requirement is a solution.
//! Otherwise its next requirement is either already satisfied,
//! by an installed version kept by the plan or by a planned addition,
//! or every catalog version matching it is tried, newest first,
//! each on its own copy of the plan.
//!
//! The search is exhaustive: it collects every consistent plan
//! before returning the first one found, which prefers newer versions.
//! This is fine for catalogs of moderate size but grows
//! with the number of version combinations.
//!
//! Branches failing on a conflict or a missing package do not stop the search,
//! their failure message is kept and returned in [PlanError::Resolution]
//! if no branch succeeds.
//!
//! ```
//! # use pkgplan::catalog::OfflineCatalog;
//! # use pkgplan::planner::Planner;
//! let mut source = OfflineCatalog::new();
//! source.add_version("menu", "1.0.0", [("icons", "1")]);
//! source.add_version("icons", "1.2.0", Vec::<(&str, &str)>::new());
//! let installed = OfflineCatalog::new();
//!
//! let planner = Planner::project(&source, &installed);
//! let plan = planner.install_plan(&["menu"], &["1"]).unwrap();
//! assert_eq!(plan.add_list().len(), 2);
//! ```

use log::{debug, trace};
use version_spec::{install_spec_from_request, SpecMatch, VersionSpec};

use crate::catalog::Catalog;
use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::package::{PackageId, PackageVersion};
use crate::plan::{Plan, Requirement};

/// Which kind of request a search serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Install,
    Upgrade,
}

/// Resolution engine over a source catalog and an installed catalog.
#[derive(Debug)]
pub struct Planner<'c, S: Catalog + ?Sized, I: Catalog + ?Sized> {
    source: &'c S,
    installed: &'c I,
    config: PlannerConfig,
}

impl<'c, S: Catalog + ?Sized, I: Catalog + ?Sized> Planner<'c, S, I> {
    /// Create a planner with explicit settings.
    pub fn with_config(source: &'c S, installed: &'c I, config: PlannerConfig) -> Self {
        Self {
            source,
            installed,
            config,
        }
    }

    /// Planner for a shared repository, where several versions of a package may coexist.
    pub fn repository(source: &'c S, installed: &'c I) -> Self {
        Self::with_config(source, installed, PlannerConfig::repository())
    }

    /// Planner for a single project, holding at most one version of each package.
    pub fn project(source: &'c S, project_installed: &'c I) -> Self {
        Self::with_config(source, project_installed, PlannerConfig::project())
    }

    /// Same planner, skipping dependency evaluation.
    pub fn without_dependencies(&self) -> Self {
        Self::with_config(
            self.source,
            self.installed,
            PlannerConfig {
                evaluate_dependencies: false,
                ..self.config
            },
        )
    }

    /// Settings of this planner.
    pub fn config(&self) -> PlannerConfig {
        self.config
    }
}

// Requests.
impl<'c, S: Catalog + ?Sized, I: Catalog + ?Sized> Planner<'c, S, I> {
    /// Plan the installation of packages.
    ///
    /// `specs` holds one requested version per name, or a single one shared by all names,
    /// or nothing to accept any version. Requested versions go through
    /// [install_spec_from_request], so `"1.2"` means a `1.2.x` version.
    pub fn install_plan<N: AsRef<str>, V: AsRef<str>>(
        &self,
        names: &[N],
        specs: &[V],
    ) -> Result<Plan, PlanError> {
        let requests = pair_requests(names, specs)?;
        debug!("planning install of {:?}", requests);
        let mut plan = Plan::new();
        for (name, spec) in requests {
            let spec = install_spec_from_request(spec);
            self.source.find(name, &spec)?;
            plan.push_requirement(name, spec, None);
        }
        let solutions = self.search(plan, Mode::Install)?;
        first_solution(solutions)
    }

    /// Plan the removal of installed packages.
    ///
    /// Each name and spec must designate an installed version, the newest matching one is removed.
    /// When dependencies are evaluated, removing a version still needed by another fails.
    pub fn remove_plan<N: AsRef<str>, V: AsRef<str>>(
        &self,
        names: &[N],
        specs: &[V],
    ) -> Result<Plan, PlanError> {
        let requests = pair_requests(names, specs)?;
        debug!("planning removal of {:?}", requests);
        let mut plan = Plan::new();
        for (name, spec) in requests {
            let spec = VersionSpec::parse(spec);
            let entry = self
                .installed
                .matching(name, &spec)
                .into_iter()
                .next()
                .ok_or_else(|| PlanError::NotInstalled {
                    package: name.to_string(),
                    spec,
                })?;
            plan.remove_package(entry);
        }
        if self.config.evaluate_dependencies {
            let missing = self.list_missing_dependencies(&plan);
            if !missing.is_empty() {
                return Err(PlanError::HasDependents { missing });
            }
        }
        Ok(plan)
    }

    /// Plan the upgrade of installed packages.
    ///
    /// Every combination of newer versions satisfying the requested specs is tried,
    /// a package without any newer version is left untouched.
    /// When dependencies are evaluated, the first plan breaking no dependency is returned.
    pub fn upgrade_plan<N: AsRef<str>, V: AsRef<str>>(
        &self,
        names: &[N],
        specs: &[V],
    ) -> Result<Plan, PlanError> {
        let requests = pair_requests(names, specs)?;
        debug!("planning upgrade of {:?}", requests);
        let mut branches = vec![Plan::new()];
        for (name, spec) in requests {
            let spec = install_spec_from_request(spec);
            let mut next = Vec::new();
            for plan in branches {
                next.extend(self.upgrade_package(plan, name, &spec)?);
            }
            branches = next;
        }

        let mut solutions = Vec::new();
        let mut failures = Vec::new();
        for plan in branches {
            match self.search(plan, Mode::Upgrade) {
                Ok(found) => solutions.extend(found),
                Err(PlanError::Resolution { messages }) => failures.extend(messages),
                Err(err) => failures.push(err.to_string()),
            }
        }
        if solutions.is_empty() {
            return Err(PlanError::Resolution { messages: failures });
        }
        if !self.config.evaluate_dependencies {
            return first_solution(solutions);
        }

        let mut first_missing = None;
        for plan in solutions {
            let missing = self.list_missing_dependencies(&plan);
            if missing.is_empty() {
                return Ok(plan);
            }
            trace!("upgrade plan rejected, missing {:?}", missing);
            first_missing.get_or_insert(missing);
        }
        Err(PlanError::HasDependents {
            missing: first_missing.unwrap_or_default(),
        })
    }

    /// Resolve every pending requirement of a plan,
    /// returning all the complete plans found.
    pub fn eval_requirements(&self, plan: Plan) -> Result<Vec<Plan>, PlanError> {
        self.search(plan, Mode::Install)
    }

    /// Dependencies of the packages present after applying the plan that it leaves unsatisfied.
    pub fn list_missing_dependencies(&self, plan: &Plan) -> Vec<(String, VersionSpec)> {
        let kept = self
            .installed
            .all_versions()
            .into_iter()
            .filter(|entry| !plan.is_on_remove_list(entry.id()));
        let mut missing: Vec<(String, VersionSpec)> = Vec::new();
        for entry in kept.chain(plan.add_list()) {
            for (name, spec) in entry.dependencies() {
                if self.is_satisfied(plan, name, spec) {
                    continue;
                }
                if !missing.iter().any(|(n, s)| n == name && s == spec) {
                    missing.push((name.clone(), *spec));
                }
            }
        }
        missing
    }
}

// Search.
impl<'c, S: Catalog + ?Sized, I: Catalog + ?Sized> Planner<'c, S, I> {
    fn search(&self, plan: Plan, mode: Mode) -> Result<Vec<Plan>, PlanError> {
        let mut worklist = vec![plan];
        let mut solutions = Vec::new();
        let mut failures = Vec::new();

        while let Some(mut plan) = worklist.pop() {
            let Some(requirement) = plan.pop_requirement() else {
                trace!("solution found");
                solutions.push(plan);
                continue;
            };
            trace!("resolving {}", requirement);
            if self.is_satisfied(&plan, requirement.name(), requirement.spec()) {
                plan.record_requirement(requirement);
                worklist.push(plan);
                continue;
            }

            let candidates = self.source.matching(requirement.name(), requirement.spec());
            if candidates.is_empty() {
                let err = match self.source.find(requirement.name(), requirement.spec()) {
                    Err(err) => err.to_string(),
                    Ok(_) => format!("no version of {}", requirement),
                };
                failures.push(with_origin(err, &requirement));
                continue;
            }

            let mut branches = Vec::new();
            for candidate in candidates {
                match self.try_add(&plan, &requirement, candidate, mode) {
                    Ok(plans) => branches.extend(plans),
                    Err(message) => {
                        trace!("{}", message);
                        failures.push(message);
                    }
                }
            }
            // The worklist is a stack: push newest candidates last so they are explored first.
            worklist.extend(branches.into_iter().rev());
        }

        debug!(
            "search done, {} solutions, {} failed branches",
            solutions.len(),
            failures.len()
        );
        if solutions.is_empty() {
            return Err(PlanError::Resolution { messages: failures });
        }
        Ok(solutions)
    }

    /// Extend a plan with a candidate version for a requirement.
    fn try_add(
        &self,
        plan: &Plan,
        requirement: &Requirement,
        candidate: &PackageVersion,
        mode: Mode,
    ) -> Result<Vec<Plan>, String> {
        let allow_multiple = self.config.allow_multiple_versions;
        let mut next = plan.clone();
        if mode == Mode::Upgrade {
            self.upgrade_installed(&mut next, candidate);
        }

        if !allow_multiple {
            let conflicting = self
                .installed
                .versions(candidate.name())
                .unwrap_or_default()
                .iter()
                .find(|entry| {
                    entry.version() != candidate.version() && !next.is_on_remove_list(entry.id())
                });
            if let Some(installed) = conflicting {
                return Err(with_origin(
                    format!("{} conflicts with installed {}", candidate, installed),
                    requirement,
                ));
            }
        }

        let required_by = if requirement.is_locked() {
            None
        } else {
            requirement.required_by().first().cloned()
        };
        match next.package_on_add_list(candidate.name()).cloned() {
            Some(planned) if next.will_conflict(candidate.id(), allow_multiple) => {
                if mode != Mode::Upgrade || !can_substitute(&next, &planned, candidate) {
                    return Err(with_origin(
                        format!("{} conflicts with planned {}", candidate, planned),
                        requirement,
                    ));
                }
                trace!("substituting {} for {}", candidate, planned);
                next.replace_planned_package(
                    planned.id(),
                    candidate,
                    *requirement.spec(),
                    required_by,
                );
            }
            _ => {
                next.add_package(candidate, *requirement.spec(), required_by);
            }
        }
        next.record_requirement(requirement.clone());

        if self.config.evaluate_dependencies {
            for (name, spec) in candidate.dependencies() {
                next.push_requirement(name.clone(), *spec, Some(candidate.id().clone()));
            }
        }
        Ok(vec![next])
    }

    /// Whether an installed version kept by the plan, or a planned addition, satisfies the spec.
    fn is_satisfied(&self, plan: &Plan, name: &str, spec: &VersionSpec) -> bool {
        self.installed
            .matching(name, spec)
            .iter()
            .any(|entry| !plan.is_on_remove_list(entry.id()))
            || plan.satisfies_requirement(name, spec)
    }
}

// Upgrades.
impl<'c, S: Catalog + ?Sized, I: Catalog + ?Sized> Planner<'c, S, I> {
    /// Branch a plan on every newer version of one installed package.
    fn upgrade_package(
        &self,
        plan: Plan,
        name: &str,
        spec: &VersionSpec,
    ) -> Result<Vec<Plan>, PlanError> {
        let installed = self.installed.versions(name).unwrap_or_default();
        let not_installed = || PlanError::NotInstalled {
            package: name.to_string(),
            spec: *spec,
        };
        let newest_installed = installed.last().ok_or_else(not_installed)?;
        self.source.find(name, spec)?;

        let replaced: Vec<&PackageVersion> = if self.config.allow_multiple_versions {
            // Versions above the spec stay, they already exceed every candidate.
            let Some(current) = installed
                .iter()
                .rev()
                .find(|entry| entry.matches(spec) != SpecMatch::Above)
            else {
                debug!("{} {} already exceeds {}", name, newest_installed.version(), spec);
                return Ok(vec![plan]);
            };
            vec![current]
        } else {
            if let Some(above) = installed
                .iter()
                .find(|entry| entry.matches(spec) == SpecMatch::Above)
            {
                return Err(PlanError::InvalidUpgrade {
                    package: name.to_string(),
                    spec: *spec,
                    installed: above.version(),
                });
            }
            installed.iter().collect()
        };
        let floor = replaced
            .iter()
            .map(|entry| entry.version())
            .max()
            .ok_or_else(not_installed)?;

        let candidates: Vec<&PackageVersion> = self
            .source
            .matching(name, spec)
            .into_iter()
            .filter(|candidate| candidate.version() > floor)
            .collect();
        if candidates.is_empty() {
            debug!("{} {} is already up to date", name, floor);
            return Ok(vec![plan]);
        }

        let branches = candidates
            .into_iter()
            .map(|candidate| {
                let mut branch = plan.clone();
                branch.push_requirement(name, VersionSpec::exact(candidate.version()), None);
                for entry in &replaced {
                    branch.remove_package(entry);
                    self.mark_upgradable(&mut branch, entry);
                }
                branch
            })
            .collect();
        Ok(branches)
    }

    /// Mark an installed version, and the installed versions it transitively depends on,
    /// as replaceable by newer versions during this upgrade.
    fn mark_upgradable(&self, plan: &mut Plan, entry: &PackageVersion) {
        let mut stack = vec![entry.id().clone()];
        let mut dependencies = Vec::new();
        while let Some(id) = stack.pop() {
            if plan.is_upgradable(&id) {
                continue;
            }
            dependencies.clear();
            if let Some(installed) = self.installed.get(&id) {
                for (name, spec) in installed.dependencies() {
                    dependencies.extend(
                        self.installed
                            .matching(name, spec)
                            .into_iter()
                            .map(|dependency| dependency.id().clone()),
                    );
                }
            }
            plan.mark_upgradable(id);
            stack.append(&mut dependencies);
        }
    }

    /// While upgrading, adding a new version of an installed package marked upgradable
    /// replaces the closest installed version below it.
    fn upgrade_installed(&self, plan: &mut Plan, candidate: &PackageVersion) {
        let replaced = self
            .installed
            .versions(candidate.name())
            .unwrap_or_default()
            .iter()
            .rev()
            .filter(|entry| entry.version() < candidate.version())
            .find(|entry| plan.is_upgradable(entry.id()) && !plan.is_on_remove_list(entry.id()));
        if let Some(entry) = replaced {
            trace!("upgrading installed {} to {}", entry, candidate);
            plan.remove_package(entry);
        }
    }
}

/// A planned version may be swapped for a candidate
/// if the candidate satisfies every requirement the planned one was added for.
fn can_substitute(plan: &Plan, planned: &PackageVersion, candidate: &PackageVersion) -> bool {
    plan.requirements_for(planned.name())
        .filter(|requirement| requirement.is_satisfied_by(planned))
        .all(|requirement| requirement.is_satisfied_by(candidate))
}

/// Pair up requested names and specs.
fn pair_requests<'a, N: AsRef<str>, V: AsRef<str>>(
    names: &'a [N],
    specs: &'a [V],
) -> Result<Vec<(&'a str, &'a str)>, PlanError> {
    let names = names.iter().map(|name| name.as_ref());
    match specs {
        [] => Ok(names.map(|name| (name, "*")).collect()),
        [spec] => Ok(names.map(|name| (name, spec.as_ref())).collect()),
        _ if specs.len() == names.len() => {
            Ok(names.zip(specs.iter().map(|spec| spec.as_ref())).collect())
        }
        _ => Err(PlanError::Usage(format!(
            "got {} package names but {} version specs",
            names.len(),
            specs.len()
        ))),
    }
}

fn first_solution(solutions: Vec<Plan>) -> Result<Plan, PlanError> {
    solutions
        .into_iter()
        .next()
        .ok_or_else(|| PlanError::Resolution {
            messages: Vec::new(),
        })
}

fn with_origin(message: String, requirement: &Requirement) -> String {
    let origins: Vec<String> = requirement
        .required_by()
        .iter()
        .map(PackageId::to_string)
        .collect();
    if origins.is_empty() {
        message
    } else {
        format!("{} (required by {})", message, origins.join(", "))
    }
}
