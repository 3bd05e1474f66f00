//! Constraint interpretation abstraction for different ecosystems

use crate::parser::types::Ecosystem;
use crate::version::constraint::Constraint;
use crate::version::semver::Version;

/// Trait for ecosystem-specific constraint grammars
///
/// Each ecosystem spells requirements differently:
/// - npm: `^1.0.0 || ~2.1`, bare versions are exact
/// - crates.io: `1.2` is an implicit caret
/// - NuGet: interval notation such as `[1.0,2.0)`
pub trait VersionMatcher: Send + Sync {
    /// Returns the ecosystem this matcher handles
    fn ecosystem(&self) -> Ecosystem;

    /// Interpret a raw constraint string
    ///
    /// Text that cannot be tokenized yields an empty [`Constraint`].
    fn interpret(&self, raw: &str) -> Constraint;

    /// Check if a constraint matches any available version
    fn version_exists(&self, raw: &str, available_versions: &[String]) -> bool {
        let constraint = self.interpret(raw);
        available_versions
            .iter()
            .any(|v| constraint.allows(&Version::parse(v)))
    }
}
