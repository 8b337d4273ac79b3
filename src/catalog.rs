// SPDX-License-Identifier: MPL-2.0

//! Catalogs of package versions, either available for installation or already installed.

use version_spec::{SpecMatch, Version, VersionSpec};

use crate::error::PlanError;
use crate::package::{PackageId, PackageVersion};
use crate::type_aliases::FxIndexMap;

/// Trait giving the planner access to a set of package versions.
///
/// The planner takes two of them: the source catalog lists what can be installed,
/// the installed catalog lists what is currently present.
pub trait Catalog {
    /// Lists the versions of a package, sorted from the oldest to the newest.
    /// Returns [None] if the catalog knows nothing about that package.
    fn versions(&self, package: &str) -> Option<&[PackageVersion]>;

    /// Lists the names of every package in the catalog.
    fn packages(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    /// Versions of a package matching a spec, newest first.
    ///
    /// The scan stops at the first version below the spec,
    /// since every older version would be below it too.
    fn matching(&self, package: &str, spec: &VersionSpec) -> Vec<&PackageVersion> {
        let mut found = Vec::new();
        for candidate in self.versions(package).unwrap_or_default().iter().rev() {
            match candidate.matches(spec) {
                SpecMatch::Above => continue,
                SpecMatch::Below => break,
                SpecMatch::Match => found.push(candidate),
            }
        }
        found
    }

    /// Newest version of a package matching a spec.
    fn find(&self, package: &str, spec: &VersionSpec) -> Result<&PackageVersion, PlanError> {
        if self.versions(package).map_or(true, <[_]>::is_empty) {
            return Err(PlanError::UnknownPackage {
                package: package.to_string(),
            });
        }
        self.matching(package, spec)
            .into_iter()
            .next()
            .ok_or_else(|| PlanError::UnknownPackageVersion {
                package: package.to_string(),
                spec: *spec,
            })
    }

    /// Entry of an exact package version.
    fn get(&self, id: &PackageId) -> Option<&PackageVersion> {
        self.versions(&id.name)?
            .iter()
            .find(|candidate| candidate.version() == id.version)
    }

    /// Whether the catalog holds that exact package version.
    fn contains(&self, id: &PackageId) -> bool {
        self.get(id).is_some()
    }

    /// Every version of every package.
    fn all_versions(&self) -> Vec<&PackageVersion> {
        self.packages()
            .flat_map(|package| self.versions(package).unwrap_or_default())
            .collect()
    }
}

/// A basic implementation of [Catalog] holding everything in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OfflineCatalog {
    packages: FxIndexMap<String, Vec<PackageVersion>>,
}

impl OfflineCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a package version with its dependencies, given as `name -> spec` strings.
    /// Registering the same package version again replaces its dependencies.
    pub fn add_version<I, N, S>(
        &mut self,
        package: impl Into<String>,
        version: impl Into<Version>,
        dependencies: I,
    ) where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: AsRef<str>,
    {
        self.insert(PackageVersion::new(package, version, dependencies));
    }

    /// Registers a package version, keeping the versions of each package sorted.
    pub fn insert(&mut self, entry: PackageVersion) {
        let versions = self.packages.entry(entry.name().to_string()).or_default();
        match versions.binary_search_by(|probe| probe.version().cmp(&entry.version())) {
            Ok(index) => versions[index] = entry,
            Err(index) => versions.insert(index, entry),
        }
    }

    /// Drops a package version, returning its entry if it was present.
    /// A package left without versions is forgotten entirely.
    pub fn remove(&mut self, id: &PackageId) -> Option<PackageVersion> {
        let versions = self.packages.get_mut(&id.name)?;
        let index = versions.iter().position(|entry| entry.version() == id.version)?;
        let removed = versions.remove(index);
        if versions.is_empty() {
            self.packages.shift_remove(&id.name);
        }
        Some(removed)
    }

    /// Number of package versions in the catalog.
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    /// Whether the catalog holds no package version.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl Catalog for OfflineCatalog {
    fn versions(&self, package: &str) -> Option<&[PackageVersion]> {
        self.packages.get(package).map(Vec::as_slice)
    }

    fn packages(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.packages.keys().map(String::as_str))
    }
}

impl FromIterator<PackageVersion> for OfflineCatalog {
    fn from_iter<T: IntoIterator<Item = PackageVersion>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

impl Extend<PackageVersion> for OfflineCatalog {
    fn extend<T: IntoIterator<Item = PackageVersion>>(&mut self, iter: T) {
        for entry in iter {
            self.insert(entry);
        }
    }
}
