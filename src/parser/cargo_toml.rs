//! Cargo.toml parser
//!
//! Reads `[package]` metadata and the `[dependencies]` table, including
//! `[dependencies.name]` sub-tables and dotted `name.version = "..."` keys.
//! Git dependencies without a version keep their repository URL as constraint.

use tree_sitter::Node;

use crate::parser::toml;
use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry, split_license_expression};

/// Parser for Cargo.toml files
pub struct CargoTomlParser;

impl CargoTomlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CargoTomlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for CargoTomlParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "Cargo.toml"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let tree = toml::parse_tree(content)?;
        let root = tree.root_node();
        let mut declared = DeclaredDeps::default();

        let mut cursor = root.walk();
        for table in root.children(&mut cursor) {
            let Some(name) = toml::table_name(table, content) else {
                continue;
            };

            match name.as_str() {
                "package" => Self::read_package(table, content, &mut declared),
                "dependencies" => {
                    for pair in toml::pairs(table) {
                        if let Some(entry) = Self::dependency_from_pair(pair, content) {
                            declared.pkg_dep.push(entry);
                        }
                    }
                }
                _ => {
                    if let Some(dep_name) = name.strip_prefix("dependencies.") {
                        declared
                            .pkg_dep
                            .push(dep_entry(dep_name, &Self::requirement_of(table, content)));
                    }
                }
            }
        }

        Ok(declared)
    }
}

impl CargoTomlParser {
    fn read_package(table: Node, content: &str, declared: &mut DeclaredDeps) {
        let text = |key: &str| {
            toml::lookup(table, content, key).and_then(|v| toml::string_value(v, content))
        };

        if let Some(name) = text("name") {
            declared.pkg_name = name;
        }
        if let Some(version) = text("version") {
            declared.pkg_ver = version;
        }
        if let Some(license) = text("license") {
            declared.pkg_lic = split_license_expression(&license);
        }
        if let Some(rust_version) = text("rust-version") {
            declared.lang_ver.push(rust_version);
        }
    }

    /// Convert one `name = ...` pair of `[dependencies]` into an entry
    fn dependency_from_pair(pair: Node, content: &str) -> Option<String> {
        let key = toml::pair_key(pair, content)?;
        let value = toml::pair_value(pair)?;

        if let Some((name, suffix)) = key.split_once('.') {
            // serde.version = "1.0"; other dotted suffixes carry no version
            if suffix != "version" {
                return None;
            }
            let version = toml::string_value(value, content)?;
            return Some(dep_entry(name, &version));
        }

        match value.kind() {
            "string" => Some(dep_entry(&key, &toml::string_value(value, content)?)),
            "inline_table" => Some(dep_entry(&key, &Self::requirement_of(value, content))),
            _ => None,
        }
    }

    /// Requirement of a detailed dependency: `version`, else `git`, else unconstrained
    fn requirement_of(node: Node, content: &str) -> String {
        ["version", "git"]
            .iter()
            .find_map(|key| {
                toml::lookup(node, content, key).and_then(|v| toml::string_value(v, content))
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_package_metadata() {
        let content = r#"
[package]
name = "my-crate"
version = "0.3.1"
license = "MIT OR Apache-2.0"
rust-version = "1.75"
"#;
        let declared = CargoTomlParser::new().parse(content).unwrap();

        assert_eq!(declared.pkg_name, "my-crate");
        assert_eq!(declared.pkg_ver, "0.3.1");
        assert_eq!(
            declared.pkg_lic,
            vec!["MIT".to_string(), "Apache-2.0".to_string()]
        );
        assert_eq!(declared.lang_ver, vec!["1.75".to_string()]);
    }

    #[test]
    fn parse_extracts_dependency_forms() {
        let content = r#"
[package]
name = "my-crate"

[dependencies]
serde = "1.0"
tokio = { version = "1.35", features = ["full"] }
regex.version = "1.10"
local = { path = "../local" }
forked = { git = "https://github.com/owner/forked" }

[dependencies.reqwest]
version = "0.12"
default-features = false

[dev-dependencies]
rstest = "0.26"
"#;
        let declared = CargoTomlParser::new().parse(content).unwrap();

        assert_eq!(
            declared.pkg_dep,
            vec![
                "serde;1.0".to_string(),
                "tokio;1.35".to_string(),
                "regex;1.10".to_string(),
                "local;latest".to_string(),
                "forked;https://github.com/owner/forked".to_string(),
                "reqwest;0.12".to_string(),
            ]
        );
    }

    #[test]
    fn parse_returns_empty_for_manifest_without_package() {
        let declared = CargoTomlParser::new().parse("").unwrap();
        assert_eq!(declared, DeclaredDeps::default());
    }

    #[test]
    fn can_parse_matches_file_name() {
        let parser = CargoTomlParser::new();
        assert!(parser.can_parse("Cargo.toml"));
        assert!(!parser.can_parse("Cargo.lock"));
    }
}
