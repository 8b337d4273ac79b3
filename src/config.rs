// SPDX-License-Identifier: MPL-2.0

//! Planner settings.

/// Settings fixed for the lifetime of a [Planner](crate::planner::Planner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Whether several versions of one package may be installed side by side.
    pub allow_multiple_versions: bool,
    /// Whether dependencies of added packages are resolved,
    /// and removals checked against the packages depending on them.
    pub evaluate_dependencies: bool,
}

impl PlannerConfig {
    /// Settings for a shared repository, where versions of a package may coexist.
    pub fn repository() -> Self {
        Self {
            allow_multiple_versions: true,
            evaluate_dependencies: true,
        }
    }

    /// Settings for a single project, holding at most one version of each package.
    pub fn project() -> Self {
        Self {
            allow_multiple_versions: false,
            evaluate_dependencies: true,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::repository()
    }
}
