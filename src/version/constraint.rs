//! Parsed version constraints
//!
//! A [`Constraint`] is an OR of [`SpecifierSet`]s, each an AND of
//! (operator, version) pairs. Range forms such as caret, tilde, wildcard and
//! hyphen are lowered to bound pairs by the interpreters, so only primitive
//! comparison operators appear here.

use std::fmt;

use crate::version::semver::Version;

/// Primitive comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
        }
    }
}

/// Single (operator, version) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub op: Operator,
    pub version: Version,
}

impl Specifier {
    pub fn new(op: Operator, version: Version) -> Self {
        Self { op, version }
    }

    pub fn is_satisfied_by(&self, candidate: &Version) -> bool {
        match self.op {
            Operator::Eq => candidate == &self.version,
            Operator::NotEq => candidate != &self.version,
            Operator::Gt => candidate > &self.version,
            Operator::GtEq => candidate >= &self.version,
            Operator::Lt => candidate < &self.version,
            Operator::LtEq => candidate <= &self.version,
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// AND-combination of specifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierSet(Vec<Specifier>);

impl SpecifierSet {
    pub fn new(specifiers: Vec<Specifier>) -> Self {
        Self(specifiers)
    }

    /// Set accepting every version (`>=0.0.0`)
    pub fn any() -> Self {
        Self(vec![Specifier::new(Operator::GtEq, Version::new(0, 0, 0))])
    }

    /// Half-open range `[lower, upper)`
    pub fn range(lower: Version, upper: Version) -> Self {
        Self(vec![
            Specifier::new(Operator::GtEq, lower),
            Specifier::new(Operator::Lt, upper),
        ])
    }

    pub fn single(op: Operator, version: Version) -> Self {
        Self(vec![Specifier::new(op, version)])
    }

    pub fn specifiers(&self) -> &[Specifier] {
        &self.0
    }

    pub fn extend(&mut self, other: SpecifierSet) {
        self.0.extend(other.0);
    }

    pub fn is_satisfied_by(&self, candidate: &Version) -> bool {
        self.0.iter().all(|s| s.is_satisfied_by(candidate))
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// OR-combination of specifier sets
///
/// An empty constraint is the parse-failure value and admits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraint(Vec<SpecifierSet>);

impl Constraint {
    pub fn new(sets: Vec<SpecifierSet>) -> Self {
        Self(sets)
    }

    /// Constraint admitting every version
    pub fn unconstrained() -> Self {
        Self(vec![SpecifierSet::any()])
    }

    /// Parse-failure value
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sets(&self) -> &[SpecifierSet] {
        &self.0
    }

    pub fn allows(&self, candidate: &Version) -> bool {
        self.0.iter().any(|set| set.is_satisfied_by(candidate))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join(" || "))
    }
}
