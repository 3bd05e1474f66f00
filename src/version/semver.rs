//! Lax semantic version model shared by every ecosystem
//!
//! Registries publish versions in many shapes (`v1.2.3`, `go1.17.6`, `5.0rc1`,
//! `2020.8.25.1`). [`Version::parse`] never fails: each of the first three dot
//! segments contributes its leading digit run, anything after that run becomes
//! part of the prerelease and missing components default to zero.

use std::cmp::Ordering;
use std::fmt;

/// Comparable version value
///
/// Equality and ordering ignore build metadata.
#[derive(Debug, Clone, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
    pub build: Option<String>,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    /// Parse a version string, producing a best-effort value for malformed input
    ///
    /// Examples:
    /// - "1" -> 1.0.0
    /// - "v1.2" -> 1.2.0
    /// - "1.0rc1" -> 1.0.0-rc1
    /// - "1.2.3-beta.1+build5" -> 1.2.3-beta.1 (build "build5")
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (text, build) = match text.split_once('+') {
            Some((head, build)) if !build.is_empty() => (head, Some(build.to_string())),
            Some((head, _)) => (head, None),
            None => (text, None),
        };
        let (core, channel) = match text.split_once('-') {
            Some((core, channel)) => (core, channel),
            None => (text, ""),
        };

        let mut numbers = [0u64; 3];
        let mut noise = String::new();
        for (slot, segment) in numbers.iter_mut().zip(core.split('.')) {
            let digits_start = segment
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(segment.len());
            let rest = &segment[digits_start..];
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            *slot = rest[..digits_end].parse().unwrap_or(0);
            noise.push_str(&rest[digits_end..]);
        }

        noise.push_str(channel);
        let pre = (!noise.is_empty()).then_some(noise);

        Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre,
            build,
        }
    }

    /// Number of dot-separated components written in a version literal (1 to 3)
    ///
    /// `^1` and `^1.0.0` expand to different ranges, so interpreters need
    /// this alongside the parsed value.
    pub fn component_count(text: &str) -> usize {
        let core = text.trim().split(['-', '+']).next().unwrap_or_default();
        core.split('.').filter(|s| !s.is_empty()).count().clamp(1, 3)
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// Compare two versions, returning -1, 0 or 1
    pub fn compare(a: &Version, b: &Version) -> i32 {
        match a.cmp(b) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }
}

/// Natural comparison of dot-separated prerelease identifiers
///
/// Numeric identifiers compare numerically and sort below alphanumeric ones.
/// When every shared identifier ties, the shorter prerelease is lower.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let a_parts: Vec<&str> = a.split('.').collect();
    let b_parts: Vec<&str> = b.split('.').collect();

    for (x, y) in a_parts.iter().zip(b_parts.iter()) {
        let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => x.cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    a_parts.len().cmp(&b_parts.len())
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl From<&str> for Version {
    fn from(text: &str) -> Self {
        Version::parse(text)
    }
}

/// Find the maximum version from a list, returning its original text
///
/// Among equal versions (e.g. "1.0" and "1.0.0") the first one wins.
pub fn find_semantic_max(versions: &[String]) -> Option<String> {
    let mut best: Option<(&String, Version)> = None;
    for original in versions {
        let parsed = Version::parse(original);
        match &best {
            Some((_, current)) if parsed <= *current => {}
            _ => best = Some((original, parsed)),
        }
    }
    best.map(|(original, _)| original.clone())
}
