//! npm version matcher
//!
//! Supports npm semver range specifications:
//! - `1.2.3` - exact match
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `*` - wildcards
//! - `1.0.0 - 2.0.0` - inclusive hyphen range
//! - `>=1.0.0 <2.0.0` (AND), `^1.0.0 || ^2.0.0` (OR)

use crate::parser::types::Ecosystem;
use crate::version::constraint::{Constraint, Operator};
use crate::version::matcher::VersionMatcher;
use crate::version::matchers::range::{self, TermGrammar, TildeStyle};

const GRAMMAR: TermGrammar = TermGrammar {
    bare: Operator::Eq,
    tilde: TildeStyle::Npm,
};

pub struct NpmVersionMatcher;

impl VersionMatcher for NpmVersionMatcher {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::JavaScript
    }

    fn interpret(&self, raw: &str) -> Constraint {
        let raw = raw.trim();
        if matches!(raw, "" | "*" | "x" | "X" | "latest") {
            return Constraint::unconstrained();
        }
        range::or_expression(raw, "||", GRAMMAR)
    }
}
