// SPDX-License-Identifier: MPL-2.0

//! Handling planner errors.

use thiserror::Error;
use version_spec::{Version, VersionSpec};

/// Errors that may occur while planning package changes.
///
/// All of them are fatal to the planning call that returned them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The caller passed malformed arguments.
    #[error("usage error: {0}")]
    Usage(String),

    /// The source catalog does not know this package at all.
    #[error("unknown package {package}")]
    UnknownPackage {
        /// Package that was requested.
        package: String,
    },

    /// The source catalog has no version of the package matching the spec.
    #[error("unknown package version {package} {spec}")]
    UnknownPackageVersion {
        /// Package that was requested.
        package: String,
        /// Constraint no version satisfies.
        spec: VersionSpec,
    },

    /// A remove or upgrade target is absent from the installed catalog.
    #[error("{package} {spec} is not installed")]
    NotInstalled {
        /// Package that was targeted.
        package: String,
        /// Constraint no installed version satisfies.
        spec: VersionSpec,
    },

    /// An upgrade target is already installed above the requested spec.
    #[error("cannot upgrade {package} to {spec}: version {installed} is already installed")]
    InvalidUpgrade {
        /// Package that was targeted.
        package: String,
        /// Constraint requested by the caller.
        spec: VersionSpec,
        /// Installed version exceeding the constraint.
        installed: Version,
    },

    /// The requested change would leave some dependencies unsatisfied.
    #[error("packages still depend on it, missing {}", list_missing(.missing))]
    HasDependents {
        /// Dependencies left unsatisfied, as package name and constraint.
        missing: Vec<(String, VersionSpec)>,
    },

    /// No combination of versions satisfies every requirement.
    /// Holds the failure message of every abandoned branch.
    #[error("unable to resolve dependencies:\n{}", .messages.join("\n"))]
    Resolution {
        /// Failure messages collected during the search.
        messages: Vec<String>,
    },
}

fn list_missing(missing: &[(String, VersionSpec)]) -> String {
    missing
        .iter()
        .map(|(name, spec)| format!("{} {}", name, spec))
        .collect::<Vec<_>>()
        .join(", ")
}
