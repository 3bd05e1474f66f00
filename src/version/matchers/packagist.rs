//! Packagist (Composer) version matcher
//!
//! Supports Composer constraint syntax:
//! - `1.2.3` - exact match
//! - `^1.2.3` - caret range (same as npm)
//! - `~1.2` - next significant release (>=1.2.0 <2.0.0), `~1.2.3` (>=1.2.3 <1.3.0)
//! - `1.2.*` - wildcard
//! - `>=1.0 <2.0`, `>=1.0,<2.0` - AND
//! - `^1.0 | ^2.0`, `^1.0 || ^2.0` - OR
//! - `@stable`-style stability flags and a leading `v` are ignored

use crate::parser::types::Ecosystem;
use crate::version::constraint::{Constraint, Operator};
use crate::version::matcher::VersionMatcher;
use crate::version::matchers::range::{self, TermGrammar, TildeStyle};

const GRAMMAR: TermGrammar = TermGrammar {
    bare: Operator::Eq,
    tilde: TildeStyle::Pessimistic,
};

pub struct PackagistVersionMatcher;

/// Remove `@dev`, `@stable` and similar stability suffixes from every term
fn strip_stability_flags(raw: &str) -> String {
    raw.split_whitespace()
        .map(|term| term.split('@').next().unwrap_or(term))
        .filter(|term| !term.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl VersionMatcher for PackagistVersionMatcher {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }

    fn interpret(&self, raw: &str) -> Constraint {
        let cleaned = strip_stability_flags(raw);
        if matches!(cleaned.as_str(), "" | "*" | "latest") {
            return Constraint::unconstrained();
        }

        let normalized = cleaned.replace("||", "|");
        range::or_expression(&normalized, "|", GRAMMAR)
    }
}
