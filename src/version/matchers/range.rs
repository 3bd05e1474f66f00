//! Range forms shared by the per-ecosystem matchers
//!
//! Every helper lowers a textual range to primitive bound pairs:
//! - `^1.2.3` -> `>=1.2.3,<2.0.0`, `^0.2.3` -> `>=0.2.3,<0.3.0`, `^0.0.3` -> `>=0.0.3,<0.0.4`
//! - `~1.2.3` -> `>=1.2.3,<1.3.0`, `~1` -> `>=1.0.0,<2.0.0`
//! - `~>2.1` / composer `~1.2` -> `>=2.1.0,<3.0.0`
//! - `1.2.*` -> `>=1.2.0,<1.3.0`, `*` -> `>=0.0.0`
//! - `1.0.0 - 2.0.0` -> `>=1.0.0,<=2.0.0`

use crate::version::constraint::{Constraint, Operator, Specifier, SpecifierSet};
use crate::version::semver::Version;

/// How a tilde prefix widens the range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TildeStyle {
    /// npm/Cargo: patch-level changes when a minor is given
    Npm,
    /// Composer `~` and RubyGems `~>`: the last written component may grow
    Pessimistic,
}

/// Grammar knobs that differ between ecosystems
#[derive(Debug, Clone, Copy)]
pub struct TermGrammar {
    /// Operator applied to a bare version literal
    pub bare: Operator,
    pub tilde: TildeStyle,
}

/// Parse a version literal, returning the value and the number of written components
///
/// A literal must start with a digit after an optional `v` prefix.
pub fn literal(text: &str) -> Option<(Version, usize)> {
    let text = text.trim();
    let text = text
        .strip_prefix('v')
        .or_else(|| text.strip_prefix('V'))
        .unwrap_or(text);
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((Version::parse(text), Version::component_count(text)))
}

/// Smallest version above every version sharing the first `components` parts
///
/// An overflowing component carries into the one before it; `None` once
/// the major itself overflows.
pub fn next_prefix(version: &Version, components: usize) -> Option<Version> {
    match components {
        0 | 1 => version.major.checked_add(1).map(|major| Version::new(major, 0, 0)),
        2 => version
            .minor
            .checked_add(1)
            .map(|minor| Version::new(version.major, minor, 0))
            .or_else(|| next_prefix(version, 1)),
        _ => version
            .patch
            .checked_add(1)
            .map(|patch| Version::new(version.major, version.minor, patch))
            .or_else(|| next_prefix(version, 2)),
    }
}

/// `[lower, upper)`, or `>=lower` when there is no upper bound
pub fn bounded(lower: Version, upper: Option<Version>) -> SpecifierSet {
    match upper {
        Some(upper) => SpecifierSet::range(lower, upper),
        None => SpecifierSet::single(Operator::GtEq, lower),
    }
}

/// Upper bound for a caret range
pub fn caret_bounds(version: Version, components: usize) -> SpecifierSet {
    let upper = if version.major != 0 || components == 1 {
        next_prefix(&version, 1)
    } else if version.minor != 0 || components == 2 {
        next_prefix(&version, 2)
    } else {
        next_prefix(&version, 3)
    };
    bounded(version, upper)
}

pub fn tilde_bounds(version: Version, components: usize, style: TildeStyle) -> SpecifierSet {
    let upper = match (style, components) {
        (TildeStyle::Npm, 1) => next_prefix(&version, 1),
        (TildeStyle::Npm, _) => next_prefix(&version, 2),
        (TildeStyle::Pessimistic, 3) => next_prefix(&version, 2),
        (TildeStyle::Pessimistic, _) => next_prefix(&version, 1),
    };
    bounded(version, upper)
}

/// Range covering every version that starts with the first `components` parts
///
/// `1` -> `[1.0.0, 2.0.0)`, `1.2` -> `[1.2.0, 1.3.0)`, `1.2.3` -> `[1.2.3, 1.2.4)`
pub fn prefix_bounds(version: Version, components: usize) -> SpecifierSet {
    let lower = Version::new(version.major, version.minor, version.patch);
    let upper = next_prefix(&version, components);
    bounded(lower, upper)
}

/// Parse `1.x`, `1.2.*`, `*` style wildcards
pub fn wildcard(text: &str) -> Option<SpecifierSet> {
    let text = text.trim();
    let text = text.strip_prefix('v').unwrap_or(text);
    let parts: Vec<&str> = text.split('.').collect();
    let position = parts.iter().position(|p| is_wildcard(p))?;

    if position == 0 {
        return Some(SpecifierSet::any());
    }

    let numbers: Option<Vec<u64>> = parts[..position]
        .iter()
        .map(|p| p.parse::<u64>().ok())
        .collect();
    let numbers = numbers?;
    let version = Version::new(
        numbers[0],
        numbers.get(1).copied().unwrap_or(0),
        numbers.get(2).copied().unwrap_or(0),
    );
    Some(prefix_bounds(version, position))
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "*" | "x" | "X")
}

/// Parse an inclusive hyphen range `A - B`
pub fn hyphen(text: &str) -> Option<SpecifierSet> {
    let (from, to) = text.split_once(" - ")?;
    let (from, _) = literal(from)?;
    let (to, _) = literal(to)?;
    Some(SpecifierSet::new(vec![
        Specifier::new(Operator::GtEq, from),
        Specifier::new(Operator::LtEq, to),
    ]))
}

/// Parse a comparison such as `>=1.2`, `< 2`, `==1.0.0`, `!=1.5`
pub fn comparison(text: &str) -> Option<SpecifierSet> {
    let text = text.trim();
    const OPERATORS: [(&str, Operator); 8] = [
        (">=", Operator::GtEq),
        ("<=", Operator::LtEq),
        ("==", Operator::Eq),
        ("!=", Operator::NotEq),
        ("<>", Operator::NotEq),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        ("=", Operator::Eq),
    ];

    let (op, rest) = OPERATORS
        .iter()
        .find_map(|(prefix, op)| text.strip_prefix(prefix).map(|rest| (*op, rest)))?;
    let (version, _) = literal(rest)?;
    Some(SpecifierSet::single(op, version))
}

/// Parse one whitespace-free term under the given grammar
pub fn term(text: &str, grammar: TermGrammar) -> Option<SpecifierSet> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(rest) = text.strip_prefix("~>") {
        let (version, components) = literal(rest)?;
        return Some(tilde_bounds(version, components, TildeStyle::Pessimistic));
    }
    if let Some(rest) = text.strip_prefix('^') {
        let (version, components) = literal(rest)?;
        return Some(caret_bounds(version, components));
    }
    if let Some(rest) = text.strip_prefix('~') {
        if rest.starts_with('=') {
            return None;
        }
        let (version, components) = literal(rest)?;
        return Some(tilde_bounds(version, components, grammar.tilde));
    }
    if text.starts_with(['<', '>', '=', '!']) {
        return comparison(text);
    }
    if let Some(set) = wildcard(text) {
        return Some(set);
    }

    let (version, _) = literal(text)?;
    Some(SpecifierSet::single(grammar.bare, version))
}

/// Split a space-separated AND expression into terms, keeping `>= 1.0` together
pub fn split_terms(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut pending_operator = String::new();

    for token in text.split([' ', ',', '\t']).filter(|t| !t.is_empty()) {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '!' | '~' | '^')) {
            pending_operator.push_str(token);
            continue;
        }
        terms.push(format!("{}{}", pending_operator, token));
        pending_operator.clear();
    }

    terms
}

/// Parse an AND expression (hyphen range or list of terms)
pub fn and_expression(text: &str, grammar: TermGrammar) -> Option<SpecifierSet> {
    let text = text.trim();
    if let Some(set) = hyphen(text) {
        return Some(set);
    }

    let terms = split_terms(text);
    if terms.is_empty() {
        return None;
    }

    let mut set = SpecifierSet::default();
    for term_text in &terms {
        set.extend(term(term_text, grammar)?);
    }
    Some(set)
}

/// Parse an OR expression; any unparseable branch makes the whole constraint empty
pub fn or_expression(text: &str, separator: &str, grammar: TermGrammar) -> Constraint {
    let branches: Option<Vec<SpecifierSet>> = text
        .split(separator)
        .map(|branch| and_expression(branch, grammar))
        .collect();
    branches.map(Constraint::new).unwrap_or_default()
}
