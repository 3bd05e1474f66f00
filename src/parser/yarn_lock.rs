//! yarn.lock parser
//!
//! Reads both the classic v1 format (`lodash@^4.17.20:` headers with
//! `version "4.17.21"`) and the YAML-shaped berry format
//! (`"lodash@npm:^4.17.20":` with `version: 4.17.21`). Each resolved package
//! becomes a pinned `name;version` entry, in file order without duplicates.

use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// Package name of the first descriptor in an entry header
///
/// `"@babel/core@^7.0.0", "@babel/core@^7.1.0":` -> `@babel/core`
fn header_name(header: &str) -> Option<String> {
    let first = header
        .trim_end_matches(':')
        .split(',')
        .next()?
        .trim()
        .trim_matches('"');
    let (scope, rest) = match first.strip_prefix('@') {
        Some(rest) => ("@", rest),
        None => ("", first),
    };
    let name = rest.split('@').next()?;
    (!name.is_empty()).then(|| format!("{}{}", scope, name))
}

/// Parser for yarn.lock files
pub struct YarnLockParser;

impl ManifestParser for YarnLockParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "yarn.lock"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let mut pkg_dep: Vec<String> = Vec::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if !line.starts_with([' ', '\t']) {
                current = if trimmed.starts_with("__metadata") {
                    None
                } else {
                    header_name(trimmed)
                };
                continue;
            }

            // Only the first indentation level holds the entry's own fields
            if line.starts_with("    ") || line.starts_with("\t\t") {
                continue;
            }
            let Some(name) = &current else {
                continue;
            };
            let Some(version) = trimmed
                .strip_prefix("version:")
                .or_else(|| trimmed.strip_prefix("version "))
            else {
                continue;
            };

            let entry = dep_entry(name, version.trim().trim_matches('"'));
            if !pkg_dep.contains(&entry) {
                pkg_dep.push(entry);
            }
        }

        Ok(DeclaredDeps {
            pkg_dep,
            ..Default::default()
        })
    }
}
