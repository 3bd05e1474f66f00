//! requirements.txt parser (PEP 508 lines)
//!
//! Option lines (`-r`, `-e`, `--index-url`), comments and requirements
//! that only apply to an extra are skipped.

use std::str::FromStr;

use pep508_rs::{Requirement, VerbatimUrl, VersionOrUrl};
use tracing::warn;

use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// Parser for requirements.txt files
pub struct RequirementsTxtParser;

impl RequirementsTxtParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RequirementsTxtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for RequirementsTxtParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename.starts_with("requirements") && filename.ends_with(".txt")
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let pkg_dep = content.lines().filter_map(requirement_entry).collect();
        Ok(DeclaredDeps {
            pkg_dep,
            ..Default::default()
        })
    }
}

/// Convert one PEP 508 requirement into a `name;constraint` entry
///
/// Direct URL requirements keep the URL as their constraint.
pub fn requirement_entry(line: &str) -> Option<String> {
    let line = match line.find(" #") {
        Some(pos) => &line[..pos],
        None => line,
    };
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }

    if let Some((_, marker)) = line.split_once(';')
        && marker.contains("extra")
    {
        return None;
    }

    let req = Requirement::<VerbatimUrl>::from_str(line)
        .inspect_err(|e| warn!("Failed to parse requirement '{}': {}", line, e))
        .ok()?;

    let constraint = match &req.version_or_url {
        Some(VersionOrUrl::VersionSpecifier(specs)) => specs.to_string(),
        Some(VersionOrUrl::Url(url)) => url.to_string(),
        None => String::new(),
    };

    Some(dep_entry(&req.name.to_string(), &constraint))
}
