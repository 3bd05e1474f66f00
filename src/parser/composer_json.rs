//! composer.json parser
//!
//! The `php` requirement is the language version, and platform packages
//! (`ext-*`, `lib-*`) are not installable from Packagist so they are skipped.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// Parser for composer.json files
pub struct ComposerJsonParser;

impl ComposerJsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ComposerJsonParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ComposerJson {
    name: String,
    version: String,
    license: Option<Value>,
    require: serde_json::Map<String, Value>,
    abandoned: Option<Value>,
}

impl ManifestParser for ComposerJsonParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "composer.json"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let manifest: ComposerJson = serde_json::from_str(content).map_err(|e| {
            warn!("Failed to parse composer.json: {}", e);
            ParseError::InvalidSyntax(e.to_string())
        })?;

        let mut declared = requirements(&manifest.require);
        declared.pkg_name = manifest.name;
        declared.pkg_ver = manifest.version;
        declared.pkg_lic = license_list(manifest.license.as_ref());
        declared.deprecated = abandoned_note(manifest.abandoned.as_ref());
        Ok(declared)
    }
}

/// `license` may be a single string or a list of strings
///
/// Shared with the Packagist registry.
pub fn license_list(license: Option<&Value>) -> Vec<String> {
    match license {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Split a `require` map into dependencies and the PHP language constraint
pub fn requirements(require: &serde_json::Map<String, Value>) -> DeclaredDeps {
    let mut declared = DeclaredDeps::default();
    for (name, constraint) in require {
        let constraint = constraint.as_str().unwrap_or_default();
        if name == "php" {
            declared.lang_ver.push(constraint.to_string());
        } else if !name.starts_with("ext-") && !name.starts_with("lib-") {
            declared.pkg_dep.push(dep_entry(name, constraint));
        }
    }
    declared
}

/// `abandoned: true` or `abandoned: "replacement/package"`
pub fn abandoned_note(abandoned: Option<&Value>) -> Option<String> {
    match abandoned {
        Some(Value::Bool(true)) => Some("abandoned".to_string()),
        Some(Value::String(replacement)) => {
            Some(format!("abandoned, use {} instead", replacement))
        }
        _ => None,
    }
}
