//! Pipenv manifests: `Pipfile` (TOML) and `Pipfile.lock` (JSON)
//!
//! Only runtime packages are read; `[dev-packages]` and the lock's
//! `develop` section are skipped. The Python version comes from
//! `[requires]` or `_meta.requires`.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use tree_sitter::Node;

use crate::parser::toml;
use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// `"*"` means any version
fn constraint_text(text: String) -> String {
    if text.trim() == "*" { String::new() } else { text }
}

/// Parser for Pipfile
pub struct PipfileParser;

impl ManifestParser for PipfileParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "Pipfile"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let tree = toml::parse_tree(content)?;
        let root = tree.root_node();
        let mut declared = DeclaredDeps::default();

        let mut cursor = root.walk();
        for table in root.children(&mut cursor) {
            match toml::table_name(table, content).as_deref() {
                Some("packages") => {
                    for pair in toml::pairs(table) {
                        if let Some(entry) = package_entry(pair, content) {
                            declared.pkg_dep.push(entry);
                        }
                    }
                }
                Some("requires") => {
                    let version = ["python_full_version", "python_version"]
                        .iter()
                        .find_map(|key| {
                            toml::lookup(table, content, key)
                                .and_then(|v| toml::string_value(v, content))
                        });
                    declared.lang_ver.extend(version);
                }
                _ => {}
            }
        }

        Ok(declared)
    }
}

fn package_entry(pair: Node, content: &str) -> Option<String> {
    let name = toml::pair_key(pair, content)?;
    let value = toml::pair_value(pair)?;
    let constraint = match value.kind() {
        "inline_table" => ["version", "git"]
            .iter()
            .find_map(|key| {
                toml::lookup(value, content, key).and_then(|v| toml::string_value(v, content))
            })
            .unwrap_or_default(),
        _ => toml::string_value(value, content)?,
    };
    Some(dep_entry(&name, &constraint_text(constraint)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PipfileLock {
    #[serde(rename = "_meta")]
    meta: Value,
    default: serde_json::Map<String, Value>,
}

/// Parser for Pipfile.lock
pub struct PipfileLockParser;

impl ManifestParser for PipfileLockParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "Pipfile.lock"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let lock: PipfileLock = serde_json::from_str(content).map_err(|e| {
            warn!("Failed to parse Pipfile.lock: {}", e);
            ParseError::InvalidSyntax(e.to_string())
        })?;

        let pkg_dep = lock
            .default
            .iter()
            .map(|(name, spec)| {
                let version = spec
                    .get("version")
                    .or_else(|| spec.get("git"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                dep_entry(name, &constraint_text(version.to_string()))
            })
            .collect();

        let lang_ver = lock
            .meta
            .pointer("/requires/python_version")
            .and_then(Value::as_str)
            .map(|v| vec![v.to_string()])
            .unwrap_or_default();

        Ok(DeclaredDeps {
            pkg_dep,
            lang_ver,
            ..Default::default()
        })
    }
}
