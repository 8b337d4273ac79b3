// SPDX-License-Identifier: MPL-2.0

//! Publicly exported type aliases.

/// Set implementation used by the library.
pub type Set<V> = rustc_hash::FxHashSet<V>;

/// Insertion ordered map, used wherever iteration order shows up in a plan.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// Dependencies declared by one package version: package name to constraint.
pub type DependencyConstraints = FxIndexMap<String, version_spec::VersionSpec>;
