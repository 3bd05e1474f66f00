//! Go module version matcher
//!
//! A Go requirement such as `v1.2.3` is treated as a lower bound, which
//! approximates Minimum Version Selection for a single module.
//! Handled forms:
//! - Standard semver: v1.2.3
//! - +incompatible suffix: v2.0.0+incompatible
//! - Toolchain tags: go1.17.6
//! - Pseudo-versions: v0.0.0-20210101000000-abcdef123456

use crate::parser::types::Ecosystem;
use crate::version::constraint::{Constraint, Operator, SpecifierSet};
use crate::version::matcher::VersionMatcher;
use crate::version::matchers::range;
use crate::version::semver::Version;

pub struct GoVersionMatcher;

/// Normalize a Go module version for comparison.
///
/// Handles:
/// - v prefix: v1.2.3 -> 1.2.3
/// - go prefix: go1.17.6 -> 1.17.6
/// - +incompatible suffix: v2.0.0+incompatible -> 2.0.0
fn normalize_go_version(version: &str) -> &str {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix("go"))
        .unwrap_or(version);
    version.strip_suffix("+incompatible").unwrap_or(version)
}

impl VersionMatcher for GoVersionMatcher {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn interpret(&self, raw: &str) -> Constraint {
        let raw = raw.trim();
        if matches!(raw, "" | "latest" | "*") {
            return Constraint::unconstrained();
        }

        if raw.starts_with(['<', '>', '=', '!']) {
            return range::comparison(raw)
                .map(|set| Constraint::new(vec![set]))
                .unwrap_or_default();
        }

        let normalized = normalize_go_version(raw);
        if !normalized.starts_with(|c: char| c.is_ascii_digit()) {
            return Constraint::empty();
        }

        Constraint::new(vec![SpecifierSet::single(
            Operator::GtEq,
            Version::parse(normalized),
        )])
    }
}
