//! pyproject.toml parser for Python dependencies (PEP 621 and Poetry)
//!
//! Supports the following sections:
//! - `[project]` - name, version, license, requires-python and PEP 508 `dependencies`
//! - `[tool.poetry]` - name, version, license
//! - `[tool.poetry.dependencies]` - Poetry constraints; `python` becomes the language version

use tree_sitter::Node;

use crate::parser::requirements_txt::requirement_entry;
use crate::parser::toml;
use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// Parser for pyproject.toml files
pub struct PyprojectTomlParser;

impl PyprojectTomlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PyprojectTomlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for PyprojectTomlParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "pyproject.toml"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let tree = toml::parse_tree(content)?;
        let root = tree.root_node();
        let mut declared = DeclaredDeps::default();

        let mut cursor = root.walk();
        for table in root.children(&mut cursor) {
            match toml::table_name(table, content).as_deref() {
                Some("project") => Self::read_project(table, content, &mut declared),
                Some("tool.poetry") => Self::read_metadata(table, content, &mut declared),
                Some("tool.poetry.dependencies") => {
                    Self::read_poetry_dependencies(table, content, &mut declared)
                }
                _ => {}
            }
        }

        Ok(declared)
    }
}

impl PyprojectTomlParser {
    fn read_project(table: Node, content: &str, declared: &mut DeclaredDeps) {
        Self::read_metadata(table, content, declared);

        if let Some(requires_python) = toml::lookup(table, content, "requires-python")
            .and_then(|v| toml::string_value(v, content))
        {
            declared.lang_ver.push(requires_python);
        }

        if let Some(dependencies) = toml::lookup(table, content, "dependencies") {
            declared.pkg_dep.extend(
                toml::string_array(dependencies, content)
                    .iter()
                    .filter_map(|line| requirement_entry(line)),
            );
        }
    }

    /// name, version and license, shared by `[project]` and `[tool.poetry]`
    fn read_metadata(table: Node, content: &str, declared: &mut DeclaredDeps) {
        let text = |key: &str| {
            toml::lookup(table, content, key).and_then(|v| toml::string_value(v, content))
        };

        if declared.pkg_name.is_empty()
            && let Some(name) = text("name")
        {
            declared.pkg_name = name;
        }
        if declared.pkg_ver.is_empty()
            && let Some(version) = text("version")
        {
            declared.pkg_ver = version;
        }

        if !declared.pkg_lic.is_empty() {
            return;
        }
        // license = "MIT" or license = { text = "MIT" }
        let license = toml::lookup(table, content, "license").and_then(|value| {
            match value.kind() {
                "inline_table" => toml::lookup(value, content, "text")
                    .and_then(|v| toml::string_value(v, content)),
                _ => toml::string_value(value, content),
            }
        });
        if let Some(license) = license {
            declared.pkg_lic.push(license);
        }
    }

    fn read_poetry_dependencies(table: Node, content: &str, declared: &mut DeclaredDeps) {
        for pair in toml::pairs(table) {
            let (Some(name), Some(value)) = (toml::pair_key(pair, content), toml::pair_value(pair))
            else {
                continue;
            };

            let constraint = match value.kind() {
                "inline_table" => toml::lookup(value, content, "version")
                    .or_else(|| toml::lookup(value, content, "git"))
                    .and_then(|v| toml::string_value(v, content))
                    .unwrap_or_default(),
                _ => toml::string_value(value, content).unwrap_or_default(),
            };

            if name == "python" {
                declared.lang_ver.push(constraint);
            } else {
                declared.pkg_dep.push(dep_entry(&name, &constraint));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_pep621_project() {
        let content = r#"
[build-system]
requires = ["setuptools>=61"]

[project]
name = "my-project"
version = "1.0.0"
license = { text = "BSD-3-Clause" }
requires-python = ">=3.8"
dependencies = [
    "requests>=2.28.0",
    "django",
    "pywin32>=300; sys_platform == 'win32'",
    "pytest; extra == 'test'",
]
"#;
        let declared = PyprojectTomlParser::new().parse(content).unwrap();

        assert_eq!(declared.pkg_name, "my-project");
        assert_eq!(declared.pkg_ver, "1.0.0");
        assert_eq!(declared.pkg_lic, vec!["BSD-3-Clause".to_string()]);
        assert_eq!(declared.lang_ver, vec![">=3.8".to_string()]);
        assert_eq!(
            declared.pkg_dep,
            vec![
                "requests;>=2.28.0".to_string(),
                "django;latest".to_string(),
                "pywin32;>=300".to_string(),
            ]
        );
    }

    #[test]
    fn parse_extracts_poetry_sections() {
        let content = r#"
[tool.poetry]
name = "poetry-demo"
version = "0.1.0"
license = "MIT"

[tool.poetry.dependencies]
python = "^3.9"
requests = "^2.31"
pendulum = { version = "~2.1", optional = true }
forked = { git = "https://github.com/owner/forked.git" }
"#;
        let declared = PyprojectTomlParser::new().parse(content).unwrap();

        assert_eq!(declared.pkg_name, "poetry-demo");
        assert_eq!(declared.pkg_lic, vec!["MIT".to_string()]);
        assert_eq!(declared.lang_ver, vec!["^3.9".to_string()]);
        assert_eq!(
            declared.pkg_dep,
            vec![
                "requests;^2.31".to_string(),
                "pendulum;~2.1".to_string(),
                "forked;https://github.com/owner/forked.git".to_string(),
            ]
        );
    }

    #[test]
    fn parse_returns_error_for_invalid_toml() {
        assert!(PyprojectTomlParser::new().parse("[project\nname =").is_err());
    }
}
