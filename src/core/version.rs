//! Version tokens and ranges.
//!
//! Recipe versions are not semver: `3.4.01`, `develop` and `10.99.99` all
//! appear side by side in the same recipe. A [`Version`] keeps the original
//! text plus a parsed component list, and ordering is delegated to a
//! [`VersionOrdering`] so the orchestrator can inject its own comparator.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Named development versions, highest first.
///
/// These sort above every numeric release.
pub const DEVELOPMENT_VERSIONS: &[&str] = &["develop", "main", "master", "head", "trunk", "stable"];

/// Error returned when a version or version range does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version `{text}`: {reason}")]
pub struct VersionParseError {
    pub text: String,
    pub reason: &'static str,
}

impl VersionParseError {
    fn new(text: &str, reason: &'static str) -> Self {
        VersionParseError {
            text: text.to_string(),
            reason,
        }
    }
}

/// One component of a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    Numeric(u64),
    Alpha(String),
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Numeric(n) => write!(f, "{}", n),
            Component::Alpha(s) => write!(f, "{}", s),
        }
    }
}

/// An ordered version token.
///
/// Equality and hashing are component-wise, so `3.4.01` and `3.4.1` are the
/// same version; the original spelling is kept for display.
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    components: Vec<Component>,
}

impl Version {
    /// Parse a version token.
    pub fn parse(s: &str) -> Result<Self, VersionParseError> {
        let text = s.trim();
        if text.is_empty() {
            return Err(VersionParseError::new(s, "version is empty"));
        }
        if text
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(VersionParseError::new(
                s,
                "only letters, digits, `.`, `-` and `_` are allowed",
            ));
        }

        let mut components = Vec::new();
        for segment in text.split(&['.', '-', '_'][..]) {
            if segment.is_empty() {
                return Err(VersionParseError::new(s, "empty version component"));
            }
            split_segment(segment, &mut components);
        }

        Ok(Version {
            text: text.to_string(),
            components,
        })
    }

    /// The version as originally written.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Parsed components.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Rank among the named development versions (`0` is `develop`).
    pub fn development_rank(&self) -> Option<usize> {
        DEVELOPMENT_VERSIONS
            .iter()
            .position(|name| self.text.eq_ignore_ascii_case(name))
    }

    /// Whether this version's components are a (non-strict) prefix of `other`'s.
    ///
    /// `3.4` is a prefix of `3.4.01`, which is how `@3.4` and `@:3.4` reach
    /// every `3.4.x` release.
    pub fn is_prefix_of(&self, other: &Version) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }
}

/// Split a separator-free segment on digit/letter boundaries.
fn split_segment(segment: &str, out: &mut Vec<Component>) {
    let mut start = 0;
    let bytes = segment.as_bytes();
    for i in 1..=bytes.len() {
        let boundary = i == bytes.len() || bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit();
        if boundary {
            let piece = &segment[start..i];
            let component = match piece.parse::<u64>() {
                Ok(n) if bytes[start].is_ascii_digit() => Component::Numeric(n),
                _ => Component::Alpha(piece.to_ascii_lowercase()),
            };
            out.push(component);
            start = i;
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.text.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Comparator used for every version comparison in the engine.
///
/// Implementations must be a total order and must treat versions that are
/// `==` as `Ordering::Equal`.
pub trait VersionOrdering: Send + Sync {
    fn compare(&self, a: &Version, b: &Version) -> Ordering;
}

/// Component-wise ordering used by recipes.
///
/// Numbers compare numerically, a number beats a word, words compare
/// lexically and a strict prefix sorts first. Development versions sort
/// above all releases.
#[derive(Debug, Clone, Copy, Default)]
pub struct DottedOrdering;

impl VersionOrdering for DottedOrdering {
    fn compare(&self, a: &Version, b: &Version) -> Ordering {
        match (a.development_rank(), b.development_rank()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => compare_components(a.components(), b.components()),
        }
    }
}

fn compare_components(a: &[Component], b: &[Component]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = match (x, y) {
            (Component::Numeric(x), Component::Numeric(y)) => x.cmp(y),
            (Component::Numeric(_), Component::Alpha(_)) => Ordering::Greater,
            (Component::Alpha(_), Component::Numeric(_)) => Ordering::Less,
            (Component::Alpha(x), Component::Alpha(y)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Semver ordering for packages that follow it.
///
/// Missing minor/patch components are filled with zero. Tokens semver
/// cannot read fall back to [`DottedOrdering`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverOrdering;

impl VersionOrdering for SemverOrdering {
    fn compare(&self, a: &Version, b: &Version) -> Ordering {
        match (
            parse_version_lenient(a.as_str()),
            parse_version_lenient(b.as_str()),
        ) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => DottedOrdering.compare(a, b),
        }
    }
}

/// Parse a version string as semver, allowing for incomplete versions.
pub fn parse_version_lenient(s: &str) -> Option<semver::Version> {
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    match parts.as_slice() {
        [major] => Some(semver::Version::new(major.parse().ok()?, 0, 0)),
        [major, minor] => Some(semver::Version::new(
            major.parse().ok()?,
            minor.parse().ok()?,
            0,
        )),
        _ => None,
    }
}

/// An inclusive version range. Either bound may be open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    low: Option<Version>,
    high: Option<Version>,
    exact: bool,
}

impl VersionRange {
    /// A range matching every version.
    pub fn any() -> Self {
        VersionRange {
            low: None,
            high: None,
            exact: false,
        }
    }

    /// A single version (`@3.4`), which also matches its extensions (`3.4.01`).
    pub fn exact(version: Version) -> Self {
        VersionRange {
            low: Some(version.clone()),
            high: Some(version),
            exact: true,
        }
    }

    /// A range between two optional bounds.
    pub fn between(low: Option<Version>, high: Option<Version>) -> Self {
        VersionRange {
            low,
            high,
            exact: false,
        }
    }

    pub fn low(&self) -> Option<&Version> {
        self.low.as_ref()
    }

    pub fn high(&self) -> Option<&Version> {
        self.high.as_ref()
    }

    /// Parse one range element: `v`, `v:`, `:v`, `lo:hi` or `:`.
    pub fn parse(s: &str) -> Result<Self, VersionParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionParseError::new(s, "empty version range"));
        }

        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [single] => Ok(VersionRange::exact(Version::parse(single)?)),
            [low, high] => {
                let low = (!low.is_empty()).then(|| Version::parse(low)).transpose()?;
                let high = (!high.is_empty()).then(|| Version::parse(high)).transpose()?;
                Ok(VersionRange::between(low, high))
            }
            _ => Err(VersionParseError::new(s, "a range has at most one `:`")),
        }
    }

    /// Whether `version` falls inside this range.
    pub fn contains(&self, version: &Version, ordering: &dyn VersionOrdering) -> bool {
        if self.exact {
            return match &self.low {
                Some(v) => ordering.compare(version, v) == Ordering::Equal || v.is_prefix_of(version),
                None => true,
            };
        }

        let above_low = match &self.low {
            Some(low) => ordering.compare(version, low) != Ordering::Less,
            None => true,
        };
        let below_high = match &self.high {
            Some(high) => {
                ordering.compare(version, high) != Ordering::Greater || high.is_prefix_of(version)
            }
            None => true,
        };
        above_low && below_high
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exact {
            if let Some(v) = &self.low {
                return write!(f, "{}", v);
            }
        }
        if let Some(low) = &self.low {
            write!(f, "{}", low)?;
        }
        f.write_str(":")?;
        if let Some(high) = &self.high {
            write!(f, "{}", high)?;
        }
        Ok(())
    }
}

/// A union of version ranges, written `1.0:1.5,2.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionConstraint {
    ranges: Vec<VersionRange>,
}

impl VersionConstraint {
    pub fn parse(s: &str) -> Result<Self, VersionParseError> {
        let ranges = s
            .split(',')
            .map(VersionRange::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VersionConstraint { ranges })
    }

    pub fn ranges(&self) -> &[VersionRange] {
        &self.ranges
    }

    pub fn contains(&self, version: &Version, ordering: &dyn VersionOrdering) -> bool {
        self.ranges.iter().any(|r| r.contains(version, ordering))
    }
}

impl From<VersionRange> for VersionConstraint {
    fn from(range: VersionRange) -> Self {
        VersionConstraint {
            ranges: vec![range],
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}
