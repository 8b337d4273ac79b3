// SPDX-License-Identifier: MPL-2.0

//! A plan is one candidate resolution of a request:
//! the package versions to add, the ones to remove,
//! and the requirements still waiting to be resolved.
//!
//! Plans are plain values. The planner clones a plan at every branch point
//! of its search, so that no two branches ever share mutable state.

use std::collections::VecDeque;
use std::fmt::{self, Display};

use version_spec::VersionSpec;

use crate::package::{PackageId, PackageVersion};
use crate::type_aliases::Set;

/// A requirement on a package: a name, a constraint on its version,
/// and the package versions that asked for it.
///
/// A requirement pushed without originator is locked:
/// it stays needed even when nothing else requires it anymore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: String,
    spec: VersionSpec,
    locked: bool,
    required_by: Vec<PackageId>,
}

impl Requirement {
    fn new(name: String, spec: VersionSpec, required_by: Option<PackageId>) -> Self {
        let mut requirement = Self {
            name,
            spec,
            locked: false,
            required_by: Vec::new(),
        };
        requirement.merge(required_by);
        requirement
    }

    fn merge(&mut self, required_by: Option<PackageId>) {
        match required_by {
            None => self.locked = true,
            Some(id) => {
                if !self.required_by.contains(&id) {
                    self.required_by.push(id);
                }
            }
        }
    }

    fn is_for(&self, name: &str, spec: &VersionSpec) -> bool {
        self.name == name && &self.spec == spec
    }

    fn is_needed(&self) -> bool {
        self.locked || !self.required_by.is_empty()
    }

    /// Name of the required package.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constraint on the required package version.
    pub fn spec(&self) -> &VersionSpec {
        &self.spec
    }

    /// Whether the requirement was asked for directly, not only by other packages.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Package versions that declared this requirement.
    pub fn required_by(&self) -> &[PackageId] {
        &self.required_by
    }

    /// Whether a package version satisfies this requirement.
    pub fn is_satisfied_by(&self, entry: &PackageVersion) -> bool {
        entry.name() == self.name && self.spec.contains(&entry.version())
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.spec)
    }
}

/// Package changes resolving a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    add: Vec<PackageVersion>,
    remove: Vec<PackageVersion>,
    /// Requirements not resolved yet.
    queue: VecDeque<Requirement>,
    /// Requirements already resolved, remembering who required what.
    resolved: Vec<Requirement>,
    replaced: Set<PackageId>,
    upgradable: Set<PackageId>,
}

// Requirement queue.
impl Plan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a requirement, merging it with a pending one on the same name and spec.
    /// Without `required_by`, the requirement is locked.
    pub fn push_requirement(
        &mut self,
        name: impl Into<String>,
        spec: VersionSpec,
        required_by: Option<PackageId>,
    ) -> &mut Self {
        let name = name.into();
        match self.queue.iter_mut().find(|r| r.is_for(&name, &spec)) {
            Some(pending) => pending.merge(required_by),
            None => self
                .queue
                .push_back(Requirement::new(name, spec, required_by)),
        }
        self
    }

    /// Take the oldest pending requirement.
    /// Returns [None] once every requirement has been resolved.
    pub fn pop_requirement(&mut self) -> Option<Requirement> {
        self.queue.pop_front()
    }

    /// Number of pending requirements.
    pub fn requirement_count(&self) -> usize {
        self.queue.len()
    }

    /// Pending requirements, in the order they will be resolved.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.queue.iter()
    }

    /// Remember a requirement as resolved, without adding any package for it.
    pub fn record_requirement(&mut self, requirement: Requirement) -> &mut Self {
        let Requirement {
            name,
            spec,
            locked,
            required_by,
        } = requirement;
        let index = match self.resolved.iter().position(|r| r.is_for(&name, &spec)) {
            Some(index) => index,
            None => {
                self.resolved.push(Requirement {
                    name,
                    spec,
                    locked: false,
                    required_by: Vec::new(),
                });
                self.resolved.len() - 1
            }
        };
        let entry = &mut self.resolved[index];
        if locked {
            entry.merge(None);
        }
        for id in required_by {
            entry.merge(Some(id));
        }
        self
    }

    /// Resolved requirements on a package name.
    pub fn requirements_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Requirement> {
        self.resolved.iter().filter(move |r| r.name == name)
    }

    /// Whether a package already planned for addition satisfies the spec.
    pub fn satisfies_requirement(&self, name: &str, spec: &VersionSpec) -> bool {
        self.add
            .iter()
            .any(|entry| entry.name() == name && spec.contains(&entry.version()))
    }
}

// Add and remove lists.
impl Plan {
    /// Whether adding this package version would clash with another version
    /// of the same package already planned for addition.
    pub fn will_conflict(&self, id: &PackageId, allow_multiple_versions: bool) -> bool {
        !allow_multiple_versions
            && self
                .add
                .iter()
                .any(|entry| entry.name() == id.name && entry.version() != id.version)
    }

    /// Plan a package version for addition, and remember the requirement it resolves.
    pub fn add_package(
        &mut self,
        entry: &PackageVersion,
        spec: VersionSpec,
        required_by: Option<PackageId>,
    ) -> &mut Self {
        if !self.is_on_add_list(entry.id()) {
            self.remove.retain(|removed| removed.id() != entry.id());
            self.add.push(entry.clone());
        }
        self.record_requirement(Requirement::new(
            entry.name().to_string(),
            spec,
            required_by,
        ))
    }

    /// Plan a package version for removal.
    /// A version planned for addition is simply dropped from the add list.
    pub fn remove_package(&mut self, entry: &PackageVersion) -> &mut Self {
        if self.is_on_add_list(entry.id()) {
            return self.remove_from_add_list(entry.id());
        }
        if !self.is_on_remove_list(entry.id()) {
            self.remove.push(entry.clone());
        }
        self
    }

    /// Drop a package version from the add list.
    ///
    /// Requirements it declared are forgotten, unless locked or also required by others,
    /// and planned packages only kept for those requirements are dropped in turn.
    pub fn remove_from_add_list(&mut self, id: &PackageId) -> &mut Self {
        let mut pending = vec![id.clone()];
        while let Some(id) = pending.pop() {
            let Some(index) = self.add.iter().position(|entry| entry.id() == &id) else {
                continue;
            };
            self.add.remove(index);
            for requirement in self.resolved.iter_mut().chain(self.queue.iter_mut()) {
                requirement.required_by.retain(|by| by != &id);
            }
            self.queue.retain(Requirement::is_needed);
            let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.resolved)
                .into_iter()
                .partition(Requirement::is_needed);
            self.resolved = kept;
            for entry in &self.add {
                let orphaned = dropped.iter().any(|r| r.is_satisfied_by(entry))
                    && !self.resolved.iter().any(|r| r.is_satisfied_by(entry));
                if orphaned {
                    pending.push(entry.id().clone());
                }
            }
        }
        self
    }

    /// Swap a planned package version for another one,
    /// remembering the old one as substituted.
    pub fn replace_planned_package(
        &mut self,
        old: &PackageId,
        new: &PackageVersion,
        spec: VersionSpec,
        required_by: Option<PackageId>,
    ) -> &mut Self {
        self.replaced.insert(old.clone());
        self.remove_from_add_list(old)
            .add_package(new, spec, required_by)
    }

    /// Whether that package version is planned for addition.
    pub fn is_on_add_list(&self, id: &PackageId) -> bool {
        self.add.iter().any(|entry| entry.id() == id)
    }

    /// Whether that package version is planned for removal.
    pub fn is_on_remove_list(&self, id: &PackageId) -> bool {
        self.remove.iter().any(|entry| entry.id() == id)
    }

    /// Whether some version of the package is planned for addition.
    pub fn is_package_on_add_list(&self, name: &str) -> bool {
        self.package_on_add_list(name).is_some()
    }

    /// The first version of the package planned for addition.
    pub fn package_on_add_list(&self, name: &str) -> Option<&PackageVersion> {
        self.add.iter().find(|entry| entry.name() == name)
    }

    /// Whether that package version was planned, then replaced by another one.
    pub fn was_substituted(&self, id: &PackageId) -> bool {
        self.replaced.contains(id)
    }

    /// Allow an installed package version to be replaced while resolving an upgrade.
    pub fn mark_upgradable(&mut self, id: PackageId) -> &mut Self {
        self.upgradable.insert(id);
        self
    }

    /// Whether an installed package version may be replaced while resolving an upgrade.
    pub fn is_upgradable(&self, id: &PackageId) -> bool {
        self.upgradable.contains(id)
    }

    /// Package versions to install.
    pub fn add_list(&self) -> &[PackageVersion] {
        &self.add
    }

    /// Package versions to uninstall.
    pub fn remove_list(&self) -> &[PackageVersion] {
        &self.remove
    }

    /// Package versions that were planned for addition, then replaced.
    pub fn replaced_list(&self) -> &Set<PackageId> {
        &self.replaced
    }

    /// Whether applying the plan would change nothing.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "nothing to do");
        }
        for entry in &self.remove {
            writeln!(f, "remove {}", entry)?;
        }
        for entry in &self.add {
            writeln!(f, "add {}", entry)?;
        }
        Ok(())
    }
}
