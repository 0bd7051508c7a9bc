//! Semantic API versions and route constraints.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, VersionError};

/// An API version of the form `<major>.<minor>`.
///
/// Ordering is lexicographic on `(major, minor)`, so `1.10 > 1.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    major: u32,
    minor: u32,
}

impl SemanticVersion {
    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse a version string such as `"1.0"`.
    ///
    /// Both components must be non-empty runs of ASCII digits; signs,
    /// whitespace, a third component and trailing dots are all rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || VersionError::InvalidVersionFormat {
            input: input.to_string(),
        };

        let (major, minor) = input.split_once('.').ok_or_else(invalid)?;
        let major = parse_component(major).ok_or_else(invalid)?;
        let minor = parse_component(minor).ok_or_else(invalid)?;
        Ok(Self::new(major, minor))
    }

    /// Major component.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor component.
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Compare two versions.
    pub fn compare(&self, other: &SemanticVersion) -> Ordering {
        self.cmp(other)
    }

    /// Check this version against a constraint.
    pub fn satisfies(&self, constraint: &VersionConstraint) -> bool {
        constraint.matches(self)
    }
}

fn parse_component(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A predicate over versions, used to pick route variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionConstraint {
    /// `<= v`
    LessOrEqual(SemanticVersion),
    /// `>= v`
    GreaterOrEqual(SemanticVersion),
    /// `== v`
    Exact(SemanticVersion),
    /// Matches every version.
    Any,
}

impl VersionConstraint {
    /// Evaluate the constraint.
    pub fn matches(&self, version: &SemanticVersion) -> bool {
        match self {
            VersionConstraint::LessOrEqual(v) => version <= v,
            VersionConstraint::GreaterOrEqual(v) => version >= v,
            VersionConstraint::Exact(v) => version == v,
            VersionConstraint::Any => true,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::LessOrEqual(v) => write!(f, "<={}", v),
            VersionConstraint::GreaterOrEqual(v) => write!(f, ">={}", v),
            VersionConstraint::Exact(v) => write!(f, "={}", v),
            VersionConstraint::Any => write!(f, "*"),
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    /// Parse `"<=1.0"`, `">=1.1"`, `"=1.2"`, `"1.2"` or `"*"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "*" {
            return Ok(VersionConstraint::Any);
        }
        if let Some(rest) = s.strip_prefix("<=") {
            return Ok(VersionConstraint::LessOrEqual(SemanticVersion::parse(rest)?));
        }
        if let Some(rest) = s.strip_prefix(">=") {
            return Ok(VersionConstraint::GreaterOrEqual(SemanticVersion::parse(rest)?));
        }
        let exact = s.strip_prefix('=').unwrap_or(s);
        Ok(VersionConstraint::Exact(SemanticVersion::parse(exact)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!(v("1.0"), SemanticVersion::new(1, 0));
        assert_eq!(v("0.0"), SemanticVersion::new(0, 0));
        assert_eq!(v("12.34"), SemanticVersion::new(12, 34));
        assert_eq!(v("1.00"), SemanticVersion::new(1, 0));
    }

    #[test]
    fn test_parse_invalid() {
        for input in ["", "1", "1.", ".1", "1.0.0", "+1.0", "1.-1", " 1.0", "v1.0", "a.b", "99999999999.0"] {
            let err = SemanticVersion::parse(input).unwrap_err();
            assert_eq!(
                err,
                VersionError::InvalidVersionFormat {
                    input: input.to_string()
                },
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_ordering() {
        assert_eq!(v("1.0").compare(&v("1.1")), Ordering::Less);
        assert_eq!(v("1.1").compare(&v("1.1")), Ordering::Equal);
        assert_eq!(v("2.0").compare(&v("1.9")), Ordering::Greater);
        assert!(v("1.10") > v("1.9"));
    }

    #[test]
    fn test_display_roundtrip() {
        assert_eq!(v("1.2").to_string(), "1.2");
        assert_eq!("3.4".parse::<SemanticVersion>().unwrap(), SemanticVersion::new(3, 4));
    }

    #[test]
    fn test_constraints() {
        let one_zero = v("1.0");
        let one_one = v("1.1");

        assert!(one_zero.satisfies(&VersionConstraint::LessOrEqual(one_zero)));
        assert!(!one_one.satisfies(&VersionConstraint::LessOrEqual(one_zero)));
        assert!(one_one.satisfies(&VersionConstraint::GreaterOrEqual(one_one)));
        assert!(!one_zero.satisfies(&VersionConstraint::GreaterOrEqual(one_one)));
        assert!(one_one.satisfies(&VersionConstraint::Exact(one_one)));
        assert!(!one_zero.satisfies(&VersionConstraint::Exact(one_one)));
        assert!(one_zero.satisfies(&VersionConstraint::Any));
    }

    #[test]
    fn test_constraint_parse() {
        assert_eq!(
            "<=1.0".parse::<VersionConstraint>().unwrap(),
            VersionConstraint::LessOrEqual(v("1.0"))
        );
        assert_eq!(
            ">=1.1".parse::<VersionConstraint>().unwrap(),
            VersionConstraint::GreaterOrEqual(v("1.1"))
        );
        assert_eq!("=1.2".parse::<VersionConstraint>().unwrap(), VersionConstraint::Exact(v("1.2")));
        assert_eq!("1.2".parse::<VersionConstraint>().unwrap(), VersionConstraint::Exact(v("1.2")));
        assert_eq!("*".parse::<VersionConstraint>().unwrap(), VersionConstraint::Any);
        assert!("<=x".parse::<VersionConstraint>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.1")).unwrap();
        assert_eq!(json, "\"1.1\"");
        let back: SemanticVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.1"));
        assert!(serde_json::from_str::<SemanticVersion>("\"bogus\"").is_err());
    }
}
