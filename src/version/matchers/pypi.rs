//! PyPI version matcher using PEP 440 version specifiers
//!
//! Specifiers that are not valid PEP 440 (poetry-style `^1.2`, `~1.2`, a bare
//! `1.0`) fall back to the generic range grammar where a bare version means `>=`.

use std::str::FromStr;

use pep508_rs::pep440_rs::{Operator as Pep440Operator, VersionSpecifier, VersionSpecifiers};
use tracing::debug;

use crate::parser::types::Ecosystem;
use crate::version::constraint::{Constraint, Operator, SpecifierSet};
use crate::version::matcher::VersionMatcher;
use crate::version::matchers::range::{
    self, TermGrammar, TildeStyle, bounded, next_prefix, prefix_bounds,
};
use crate::version::semver::Version;

const FALLBACK_GRAMMAR: TermGrammar = TermGrammar {
    bare: Operator::GtEq,
    tilde: TildeStyle::Npm,
};

/// Version matcher for PyPI packages using PEP 440 specifiers
pub struct PypiVersionMatcher;

impl PypiVersionMatcher {
    fn lower_specifier(specifier: &VersionSpecifier) -> Option<SpecifierSet> {
        let text = specifier.version().to_string();
        let version = Version::parse(&text);
        let components = Version::component_count(&text);

        let set = match specifier.operator() {
            Pep440Operator::Equal | Pep440Operator::ExactEqual => {
                SpecifierSet::single(Operator::Eq, version)
            }
            Pep440Operator::EqualStar => prefix_bounds(version, components),
            Pep440Operator::NotEqual | Pep440Operator::NotEqualStar => {
                SpecifierSet::single(Operator::NotEq, version)
            }
            Pep440Operator::TildeEqual => {
                // ~=1.4.2 -> >=1.4.2, ==1.4.*
                let upper = next_prefix(&version, components.saturating_sub(1).max(1));
                bounded(version, upper)
            }
            Pep440Operator::LessThan => SpecifierSet::single(Operator::Lt, version),
            Pep440Operator::LessThanEqual => SpecifierSet::single(Operator::LtEq, version),
            Pep440Operator::GreaterThan => SpecifierSet::single(Operator::Gt, version),
            Pep440Operator::GreaterThanEqual => SpecifierSet::single(Operator::GtEq, version),
            #[allow(unreachable_patterns)]
            _ => return None,
        };
        Some(set)
    }

    fn interpret_pep440(raw: &str) -> Option<Constraint> {
        let specifiers = VersionSpecifiers::from_str(raw)
            .inspect_err(|e| debug!("'{}' is not a PEP 440 specifier: {}", raw, e))
            .ok()?;

        let mut set = SpecifierSet::default();
        for specifier in specifiers.iter() {
            set.extend(Self::lower_specifier(specifier)?);
        }
        if set.specifiers().is_empty() {
            return Some(Constraint::unconstrained());
        }
        Some(Constraint::new(vec![set]))
    }
}

impl VersionMatcher for PypiVersionMatcher {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn interpret(&self, raw: &str) -> Constraint {
        let raw = raw.trim().trim_start_matches('(').trim_end_matches(')').trim();
        if matches!(raw, "" | "*" | "latest") {
            return Constraint::unconstrained();
        }

        if let Some(constraint) = Self::interpret_pep440(raw) {
            return constraint;
        }

        let normalized = raw.replace("||", "|");
        range::or_expression(&normalized, "|", FALLBACK_GRAMMAR)
    }
}
