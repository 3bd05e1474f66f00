//! RubyGems version matcher
//!
//! Supports gem requirement syntax:
//! - `1.2.3`, `= 1.2.3` - exact match
//! - `~> 2.1` - pessimistic (>=2.1 <3.0), `~> 2.1.3` (>=2.1.3 <2.2.0)
//! - `>= 1.0`, `< 2.0`, `!= 1.5` - comparison operators
//! - `>= 1.0, < 2.0` - comma-separated AND

use crate::parser::types::Ecosystem;
use crate::version::constraint::{Constraint, Operator};
use crate::version::matcher::VersionMatcher;
use crate::version::matchers::range::{self, TermGrammar, TildeStyle};

const GRAMMAR: TermGrammar = TermGrammar {
    bare: Operator::Eq,
    tilde: TildeStyle::Pessimistic,
};

pub struct RubygemsVersionMatcher;

impl VersionMatcher for RubygemsVersionMatcher {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Ruby
    }

    fn interpret(&self, raw: &str) -> Constraint {
        let raw = raw.trim();
        if matches!(raw, "" | "latest" | ">= 0" | ">=0") {
            return Constraint::unconstrained();
        }
        range::and_expression(raw, GRAMMAR)
            .map(|set| Constraint::new(vec![set]))
            .unwrap_or_default()
    }
}
