//! Concrete version selection
//!
//! Picks one version out of the registry's candidates, either the maximum
//! admissible under a [`Constraint`] or the registry's notion of "latest".

use std::collections::HashMap;

use crate::version::constraint::Constraint;
use crate::version::semver::{Version, find_semantic_max};

/// Return the original text of the highest candidate the constraint admits
///
/// Among equal versions the first candidate in input order wins. An empty
/// candidate list or an empty constraint yields `None`.
pub fn resolve(candidates: &[String], constraint: &Constraint) -> Option<String> {
    let mut best: Option<(&String, Version)> = None;
    for original in candidates {
        let parsed = Version::parse(original);
        if !constraint.allows(&parsed) {
            continue;
        }
        match &best {
            Some((_, current)) if parsed <= *current => {}
            _ => best = Some((original, parsed)),
        }
    }
    best.map(|(original, _)| original.clone())
}

/// Determine the "latest" version when no constraint was given
///
/// Prefers the registry's `latest` dist-tag, falling back to the semantic max.
pub fn find_latest(versions: &[String], dist_tags: &HashMap<String, String>) -> Option<String> {
    if let Some(latest) = dist_tags.get("latest") {
        return Some(latest.clone());
    }
    find_semantic_max(versions)
}
