// SPDX-License-Identifier: MPL-2.0

//! Package versions and the constraint language used to select them.
//!
//! A [`Version`] is a plain `major.minor.revision` triple. Missing trailing
//! components default to zero, so `"1.2"` and `"1.2.0"` are the same version.
//!
//! A [`VersionSpec`] is a dependency constraint parsed from a short string:
//!  - `*`: any version
//!  - `1.2.3!`: exactly that version
//!  - `1.2+`: that version or anything higher, across major versions
//!  - `1.2-`: that version or anything lower, across major versions
//!  - `1.0-1.5`: every version between the two bounds, both included
//!  - `1.2`: a "compatible" version, same major and at least `1.2`
//!
//! Matching a version against a spec does not return a boolean but a
//! [`SpecMatch`], telling whether the candidate is too low, acceptable, or
//! too high. Callers scanning a list of versions sorted in descending order
//! rely on that to stop early once candidates fall below a spec.
//!
//! User requests are stricter than declared dependencies:
//! [`install_spec_from_request`] turns `"1.2"` into a spec locked on the
//! `1.2` minor version, and `"1.2.3"` into an exact match.
//!
//! ## Optional features
//!
//! * `serde`: serialization and deserialization of versions and specs as strings.
//! * `proptest`: exports proptest strategies for [`Version`] and [`VersionSpec`].

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::num::IntErrorKind;
use std::str::FromStr;

#[cfg(any(feature = "proptest", test))]
use proptest::prelude::*;

/// A three-part version number, ordered lexicographically.
#[derive(Debug, Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Version {
    major: u32,
    minor: u32,
    revision: u32,
}

/// One of the three components of a [`Version`].
///
/// Components are ordered from the most significant to the least one,
/// and also express how many components a version string spelled out.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Component {
    /// The first component.
    Major,
    /// The second component.
    Minor,
    /// The third component.
    Revision,
}

// Constructors
impl Version {
    /// Create a version with "major", "minor" and "revision" values.
    pub const fn new(major: u32, minor: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    /// Version 0.0.0.
    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Parse a dot separated version string.
    ///
    /// This never fails: omitted trailing components default to 0,
    /// and components that are not numbers are read as 0.
    pub fn parse(s: &str) -> Self {
        parse_components(s).0
    }
}

// Accessors
impl Version {
    /// The major component.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// The minor component.
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// The revision component.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Find the most significant component where two versions differ,
    /// and how `self` compares to `other` on it.
    pub fn first_difference(&self, other: &Self) -> Option<(Component, Ordering)> {
        [
            (Component::Major, self.major.cmp(&other.major)),
            (Component::Minor, self.minor.cmp(&other.minor)),
            (Component::Revision, self.revision.cmp(&other.revision)),
        ]
        .into_iter()
        .find(|(_, ordering)| ordering.is_ne())
    }

    /// Format only the leading components up to `precision`.
    fn display_to(self, precision: Component) -> impl Display {
        struct Truncated(Version, Component);
        impl Display for Truncated {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                let Truncated(v, precision) = self;
                match precision {
                    Component::Major => write!(f, "{}", v.major),
                    Component::Minor => write!(f, "{}.{}", v.major, v.minor),
                    Component::Revision => write!(f, "{}", v),
                }
            }
        }
        Truncated(self, precision)
    }
}

/// Split a version string into a version and the number of components it spelled out.
fn parse_components(s: &str) -> (Version, Component) {
    let mut parts = s.trim().split('.').map(parse_component);
    let major = parts.next().unwrap_or(0);
    let (minor, revision) = (parts.next(), parts.next());
    let precision = match (minor, revision) {
        (None, _) => Component::Major,
        (Some(_), None) => Component::Minor,
        (Some(_), Some(_)) => Component::Revision,
    };
    (
        Version::new(major, minor.unwrap_or(0), revision.unwrap_or(0)),
        precision,
    )
}

/// Numbers too large for a component saturate, anything else that is not a number reads as 0.
fn parse_component(part: &str) -> u32 {
    part.trim().parse::<u32>().unwrap_or_else(|err| match err.kind() {
        IntErrorKind::PosOverflow => u32::MAX,
        _ => 0,
    })
}

// Convert a tuple (major, minor, revision) into a version.
impl From<(u32, u32, u32)> for Version {
    fn from((major, minor, revision): (u32, u32, u32)) -> Self {
        Self::new(major, minor, revision)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl FromStr for Version {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Self::parse(&s))
    }
}

/// Outcome of matching a candidate version against a [`VersionSpec`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum SpecMatch {
    /// The candidate is too low to satisfy the spec.
    Below = -1,
    /// The candidate satisfies the spec.
    Match = 0,
    /// The candidate is too high to satisfy the spec.
    Above = 1,
}

impl SpecMatch {
    /// Shorthand for `self == SpecMatch::Match`.
    pub fn is_match(self) -> bool {
        self == Self::Match
    }
}

impl From<SpecMatch> for i8 {
    fn from(m: SpecMatch) -> Self {
        m as i8
    }
}

/// The shape of a constraint, with the data only some shapes carry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Bounds {
    /// `*`
    Any,
    /// `v!`
    Exact,
    /// `v+`
    Minimum(Component),
    /// `v-`
    Maximum(Component),
    /// `a-b`, holding the inclusive upper end.
    Range(Version),
    /// bare `v`, holding how many components were given.
    Compatible(Component),
}

/// A dependency constraint on the versions of one package.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VersionSpec {
    version: Version,
    bounds: Bounds,
}

// Constructors
impl VersionSpec {
    /// Spec matching every version.
    pub fn any() -> Self {
        Self {
            version: Version::zero(),
            bounds: Bounds::Any,
        }
    }

    /// Spec matching exactly one version.
    pub fn exact(version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            bounds: Bounds::Exact,
        }
    }

    /// Spec matching that version and every higher one.
    pub fn at_least(version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            bounds: Bounds::Minimum(Component::Revision),
        }
    }

    /// Spec matching that version and every lower one.
    pub fn at_most(version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            bounds: Bounds::Maximum(Component::Revision),
        }
    }

    /// Spec matching every version between two bounds, both included.
    /// Bounds given in the wrong order are swapped.
    pub fn between(v1: impl Into<Version>, v2: impl Into<Version>) -> Self {
        let (v1, v2) = (v1.into(), v2.into());
        let (start, end) = if v1 > v2 { (v2, v1) } else { (v1, v2) };
        Self {
            version: start,
            bounds: Bounds::Range(end),
        }
    }

    /// Spec matching versions of the same major that are not lower than `version`.
    /// Only the leading components up to `precision` are significant.
    pub fn compatible(version: impl Into<Version>, precision: Component) -> Self {
        let version = version.into();
        let version = match precision {
            Component::Major => Version::new(version.major, 0, 0),
            Component::Minor => Version::new(version.major, version.minor, 0),
            Component::Revision => version,
        };
        Self {
            version,
            bounds: Bounds::Compatible(precision),
        }
    }

    /// Parse a dependency constraint string.
    ///
    /// An empty string is read as `*`. Like [`Version::parse`], this never fails.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Self::any();
        }
        if let Some(v) = s.strip_suffix('!') {
            return Self::exact(Version::parse(v));
        }
        if let Some(v) = s.strip_suffix('+') {
            let (version, precision) = parse_components(v);
            return Self {
                version,
                bounds: Bounds::Minimum(precision),
            };
        }
        if let Some(v) = s.strip_suffix('-') {
            let (version, precision) = parse_components(v);
            return Self {
                version,
                bounds: Bounds::Maximum(precision),
            };
        }
        if let Some((start, end)) = s.split_once('-') {
            return Self::between(Version::parse(start), Version::parse(end));
        }
        let (version, precision) = parse_components(s);
        Self::compatible(version, precision)
    }
}

impl VersionSpec {
    /// The version the spec is anchored on, its lower end for ranges.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The inclusive upper end of a range spec.
    pub fn range_end(&self) -> Option<Version> {
        match self.bounds {
            Bounds::Range(end) => Some(end),
            _ => None,
        }
    }

    /// Whether this is the `*` spec.
    pub fn is_any(&self) -> bool {
        self.bounds == Bounds::Any
    }

    /// Whether this spec only matches a single version.
    pub fn is_exact(&self) -> bool {
        self.bounds == Bounds::Exact
    }

    /// Compare a candidate version against this spec.
    ///
    /// The most significant differing component decides the outcome:
    ///
    /// | spec        | component | candidate lower | candidate higher     |
    /// |-------------|-----------|-----------------|----------------------|
    /// | `v!`        | any       | Below           | Above                |
    /// | `v+`        | any       | Below           | Match                |
    /// | `v-`        | any       | Match           | Above                |
    /// | `a-b`       | any       | Below           | Match up to b, Above |
    /// | `v`         | major     | Below           | Above                |
    /// | `v` (major) | minor+    | Match           | Match                |
    /// | `v`         | minor+    | Below           | Match                |
    pub fn matches(&self, candidate: &Version) -> SpecMatch {
        use Ordering::{Greater, Less};
        use SpecMatch::{Above, Below, Match};

        if self.bounds == Bounds::Any {
            return Match;
        }
        let Some((component, ordering)) = candidate.first_difference(&self.version) else {
            return Match;
        };
        match (self.bounds, component, ordering) {
            (Bounds::Any, _, _) => Match,
            (Bounds::Exact, _, Less) => Below,
            (Bounds::Exact, _, _) => Above,
            (Bounds::Minimum(_), _, Less) => Below,
            (Bounds::Minimum(_), _, _) => Match,
            (Bounds::Maximum(_), _, Less) => Match,
            (Bounds::Maximum(_), _, _) => Above,
            (Bounds::Range(_), _, Less) => Below,
            (Bounds::Range(end), _, _) if candidate <= &end => Match,
            (Bounds::Range(_), _, _) => Above,
            (Bounds::Compatible(_), Component::Major, Less) => Below,
            (Bounds::Compatible(_), Component::Major, _) => Above,
            (Bounds::Compatible(Component::Major), _, _) => Match,
            (Bounds::Compatible(_), _, Less) => Below,
            (Bounds::Compatible(_), _, Greater) => Match,
            (Bounds::Compatible(_), _, Ordering::Equal) => Match,
        }
    }

    /// Shorthand for `self.matches(candidate).is_match()`.
    pub fn contains(&self, candidate: &Version) -> bool {
        self.matches(candidate).is_match()
    }
}

impl Default for VersionSpec {
    fn default() -> Self {
        Self::any()
    }
}

impl From<&str> for VersionSpec {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl FromStr for VersionSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for VersionSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Bounds::Any => write!(f, "*"),
            Bounds::Exact => write!(f, "{}!", self.version),
            Bounds::Minimum(p) => write!(f, "{}+", self.version.display_to(p)),
            Bounds::Maximum(p) => write!(f, "{}-", self.version.display_to(p)),
            Bounds::Range(end) => write!(f, "{}-{}", self.version, end),
            Bounds::Compatible(p) => write!(f, "{}", self.version.display_to(p)),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for VersionSpec {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for VersionSpec {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Self::parse(&s))
    }
}

/// Build the spec for a version the user explicitly asked to install or upgrade to.
///
/// Requests are stricter than declared dependencies:
///  - `"2"` stays a compatible spec, any `2.x.y` is fine,
///  - `"1.2"` only accepts revisions of `1.2`, from `1.2.0` to `1.2.<max>`,
///  - `"1.2.3"` only accepts `1.2.3`.
///
/// A request already carrying an explicit operator (`*`, `!`, `+` or `-`)
/// is parsed as a regular spec.
pub fn install_spec_from_request(request: &str) -> VersionSpec {
    let request = request.trim();
    if request.is_empty() || request.contains(['*', '!', '+', '-']) {
        return VersionSpec::parse(request);
    }
    let (version, precision) = parse_components(request);
    match precision {
        Component::Major => VersionSpec::compatible(version, Component::Major),
        Component::Minor => VersionSpec::between(
            version,
            Version::new(version.major, version.minor, u32::MAX),
        ),
        Component::Revision => VersionSpec::exact(version),
    }
}

/// Generate versions with small components, so that equal components are frequent.
#[cfg(any(feature = "proptest", test))]
pub fn proptest_version_strategy() -> impl Strategy<Value = Version> {
    (0u32..4, 0u32..6, 0u32..6).prop_map(Version::from)
}

/// Generate specs of every shape, anchored on small versions.
#[cfg(any(feature = "proptest", test))]
pub fn proptest_spec_strategy() -> impl Strategy<Value = VersionSpec> {
    let component = prop_oneof![
        Just(Component::Major),
        Just(Component::Minor),
        Just(Component::Revision),
    ];
    (
        0u8..6,
        proptest_version_strategy(),
        proptest_version_strategy(),
        component,
    )
        .prop_map(|(shape, v1, v2, precision)| match shape {
            0 => VersionSpec::any(),
            1 => VersionSpec::exact(v1),
            2 => VersionSpec::at_least(v1),
            3 => VersionSpec::at_most(v1),
            4 => VersionSpec::between(v1, v2),
            _ => VersionSpec::compatible(v1, precision),
        })
}
