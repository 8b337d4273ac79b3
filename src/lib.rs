// SPDX-License-Identifier: MPL-2.0

//! Package change planning.
//!
//! Given a catalog of available package versions, a catalog of installed ones,
//! and a request to install, remove or upgrade some packages,
//! this crate computes a [Plan](plan::Plan): the package versions to add
//! and the ones to remove so that every declared dependency stays satisfied.
//!
//! # Versions and specs
//!
//! Versions are `major.minor.revision` triples and dependencies are declared
//! with a small constraint language, both provided by the `version-spec` crate
//! and re-exported here as [Version] and [VersionSpec].
//!
//! | spec      | matches                                      |
//! |-----------|----------------------------------------------|
//! | `*`       | any version                                  |
//! | `1.2.3!`  | exactly `1.2.3`                              |
//! | `1.2+`    | `1.2.0` and anything higher                  |
//! | `1.2-`    | `1.2.0` and anything lower                   |
//! | `1.0-1.5` | from `1.0.0` to `1.5.0`, both included       |
//! | `1.2`     | `1.2.0` and above, as long as the major is 1 |
//!
//! # Catalogs
//!
//! The planner reads package versions through the [Catalog](catalog::Catalog) trait.
//! [OfflineCatalog](catalog::OfflineCatalog) is a basic in memory implementation.
//!
//! # Basic example
//!
//! ```
//! # use pkgplan::catalog::OfflineCatalog;
//! # use pkgplan::planner::Planner;
//! # use pkgplan::error::PlanError;
//! let mut source = OfflineCatalog::new();
//! source.add_version("a", "1.0.0", Vec::<(&str, &str)>::new());
//! source.add_version("a", "1.1.0", [("b", "*")]);
//! source.add_version("b", "1.0.0", Vec::<(&str, &str)>::new());
//!
//! let mut installed = OfflineCatalog::new();
//! installed.add_version("a", "1.0.0", Vec::<(&str, &str)>::new());
//!
//! let planner = Planner::project(&source, &installed);
//!
//! // A project holds a single version of each package, installing another one conflicts.
//! assert!(matches!(
//!     planner.install_plan(&["a"], &["1.1.0!"]),
//!     Err(PlanError::Resolution { .. })
//! ));
//!
//! // Upgrading replaces it instead.
//! let plan = planner.upgrade_plan(&["a"], &["1.1.0!"]).unwrap();
//! print!("{}", plan);
//! ```
//!
//! # Planners
//!
//! [Planner::repository](planner::Planner::repository) plans changes to a shared
//! repository, where several versions of a package may be installed side by side.
//! [Planner::project](planner::Planner::project) plans changes to a single project,
//! where installing a second version of a package is a conflict.
//!
//! Planning does not touch the catalogs. Applying the plan, and making sure the
//! installed catalog did not change between planning and applying, is up to the caller.
//!
//! # Logging
//!
//! The planner logs through the [log] facade: requests and search results at the
//! debug level, every search step at the trace level.

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod package;
pub mod plan;
pub mod planner;
pub mod type_aliases;

pub use version_spec::{install_spec_from_request, SpecMatch, Version, VersionSpec};
