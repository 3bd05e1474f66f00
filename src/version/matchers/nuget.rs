//! NuGet version matcher
//!
//! Supports NuGet version range notation:
//! - `1.0` - minimum version, inclusive (>=1.0)
//! - `[1.0]` - exact match
//! - `(1.0,)` - greater than 1.0
//! - `(,1.0]` / `(,1.0)` - at most / less than 1.0
//! - `[1.0,2.0)` - mixed bounds
//! - `1.0.*` - floating version

use crate::parser::types::Ecosystem;
use crate::version::constraint::{Constraint, Operator, Specifier, SpecifierSet};
use crate::version::matcher::VersionMatcher;
use crate::version::matchers::range::{self, literal};

pub struct NugetVersionMatcher;

impl NugetVersionMatcher {
    fn interval(raw: &str) -> Option<SpecifierSet> {
        let lower_inclusive = match raw.chars().next()? {
            '[' => true,
            '(' => false,
            _ => return None,
        };
        let upper_inclusive = match raw.chars().last()? {
            ']' => true,
            ')' => false,
            _ => return None,
        };
        let inner = raw.get(1..raw.len() - 1)?.trim();

        let Some((lower, upper)) = inner.split_once(',') else {
            // [1.0] is the only single-value interval NuGet accepts
            if !(lower_inclusive && upper_inclusive) {
                return None;
            }
            let (version, _) = literal(inner)?;
            return Some(SpecifierSet::single(Operator::Eq, version));
        };

        let mut specifiers = Vec::new();
        let lower = lower.trim();
        if !lower.is_empty() {
            let (version, _) = literal(lower)?;
            let op = if lower_inclusive {
                Operator::GtEq
            } else {
                Operator::Gt
            };
            specifiers.push(Specifier::new(op, version));
        }
        let upper = upper.trim();
        if !upper.is_empty() {
            let (version, _) = literal(upper)?;
            let op = if upper_inclusive {
                Operator::LtEq
            } else {
                Operator::Lt
            };
            specifiers.push(Specifier::new(op, version));
        }

        if specifiers.is_empty() {
            return Some(SpecifierSet::any());
        }
        Some(SpecifierSet::new(specifiers))
    }
}

impl VersionMatcher for NugetVersionMatcher {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::CSharp
    }

    fn interpret(&self, raw: &str) -> Constraint {
        let raw = raw.trim();
        if matches!(raw, "" | "*" | "latest") {
            return Constraint::unconstrained();
        }

        let set = if raw.starts_with(['[', '(']) {
            Self::interval(raw)
        } else if let Some(set) = range::wildcard(raw) {
            Some(set)
        } else {
            literal(raw).map(|(version, _)| SpecifierSet::single(Operator::GtEq, version))
        };

        set.map(|set| Constraint::new(vec![set])).unwrap_or_default()
    }
}
