//! Crates.io version matcher
//!
//! Supports Cargo version requirement specifications:
//! - `1.2.3` - default (caret-like): >=1.2.3 <2.0.0 (or special cases for 0.x)
//! - `^1.2.3` - explicit caret (same as default)
//! - `~1.2.3` - tilde: >=1.2.3 <1.3.0
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`, `=1.2.3` - comparison operators
//! - `1.2.*`, `1.*`, `*` - wildcards
//!
//! Requirements are parsed with the `semver` crate and each comparator is
//! lowered to primitive bound pairs.

use semver::{Comparator, Op, VersionReq};
use tracing::warn;

use crate::parser::types::Ecosystem;
use crate::version::constraint::{Constraint, Operator, SpecifierSet};
use crate::version::matcher::VersionMatcher;
use crate::version::matchers::range::{
    TildeStyle, caret_bounds, next_prefix, prefix_bounds, tilde_bounds,
};
use crate::version::semver::Version;

pub struct CratesVersionMatcher;

impl CratesVersionMatcher {
    fn lower_requirement(raw: &str) -> Option<SpecifierSet> {
        let req = VersionReq::parse(raw.trim())
            .inspect_err(|e| warn!("Failed to parse version requirement '{}': {}", raw, e))
            .ok()?;

        if req.comparators.is_empty() {
            return Some(SpecifierSet::any());
        }

        let mut set = SpecifierSet::default();
        for comparator in &req.comparators {
            set.extend(Self::lower_comparator(comparator)?);
        }
        Some(set)
    }

    fn lower_comparator(comparator: &Comparator) -> Option<SpecifierSet> {
        let components = 1 + comparator.minor.is_some() as usize + comparator.patch.is_some() as usize;
        let version = Version {
            major: comparator.major,
            minor: comparator.minor.unwrap_or(0),
            patch: comparator.patch.unwrap_or(0),
            pre: (!comparator.pre.is_empty()).then(|| comparator.pre.as_str().to_string()),
            build: None,
        };

        let set = match comparator.op {
            Op::Exact if components == 3 => SpecifierSet::single(Operator::Eq, version),
            Op::Exact | Op::Wildcard => prefix_bounds(version, components),
            Op::Greater if components == 3 => SpecifierSet::single(Operator::Gt, version),
            Op::Greater => SpecifierSet::single(Operator::GtEq, next_prefix(&version, components)?),
            Op::GreaterEq => SpecifierSet::single(Operator::GtEq, version),
            Op::Less => SpecifierSet::single(Operator::Lt, version),
            Op::LessEq if components == 3 => SpecifierSet::single(Operator::LtEq, version),
            Op::LessEq => match next_prefix(&version, components) {
                Some(bound) => SpecifierSet::single(Operator::Lt, bound),
                None => SpecifierSet::any(),
            },
            Op::Tilde => tilde_bounds(version, components, TildeStyle::Npm),
            Op::Caret => caret_bounds(version, components),
            _ => return None,
        };
        Some(set)
    }
}

impl VersionMatcher for CratesVersionMatcher {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn interpret(&self, raw: &str) -> Constraint {
        let raw = raw.trim();
        if raw.is_empty() || raw == "latest" {
            return Constraint::unconstrained();
        }

        let branches: Option<Vec<SpecifierSet>> =
            raw.split("||").map(Self::lower_requirement).collect();
        branches.map(Constraint::new).unwrap_or_default()
    }
}
