// SPDX-License-Identifier: MPL-2.0

//! Identifying package versions and their declared dependencies.

use std::fmt::{self, Display};

use version_spec::{SpecMatch, Version, VersionSpec};

use crate::type_aliases::DependencyConstraints;

/// One concrete version of one package, as in `name@1.2.3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackageId {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: Version,
}

impl PackageId {
    /// Identify a version of a package.
    pub fn new(name: impl Into<String>, version: impl Into<Version>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A catalog entry: a package version and the dependencies it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackageVersion {
    id: PackageId,
    dependencies: DependencyConstraints,
}

impl PackageVersion {
    /// Create an entry from its dependencies given as `name -> spec` strings.
    /// An empty spec string stands for `*`.
    pub fn new<I, N, S>(name: impl Into<String>, version: impl Into<Version>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: AsRef<str>,
    {
        Self {
            id: PackageId::new(name, version),
            dependencies: dependencies
                .into_iter()
                .map(|(name, spec)| (name.into(), VersionSpec::parse(spec.as_ref())))
                .collect(),
        }
    }

    /// Create an entry with already parsed dependency constraints.
    pub fn with_constraints(id: PackageId, dependencies: DependencyConstraints) -> Self {
        Self { id, dependencies }
    }

    /// Identifier of this entry.
    pub fn id(&self) -> &PackageId {
        &self.id
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Package version.
    pub fn version(&self) -> Version {
        self.id.version
    }

    /// Declared dependencies, in declaration order.
    pub fn dependencies(&self) -> &DependencyConstraints {
        &self.dependencies
    }

    /// Compare this entry's version against a constraint.
    pub fn matches(&self, spec: &VersionSpec) -> SpecMatch {
        spec.matches(&self.id.version)
    }
}

impl Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
