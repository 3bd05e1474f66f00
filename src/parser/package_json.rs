//! package.json parser

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// Parser for package.json files
pub struct PackageJsonParser;

impl PackageJsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PackageJsonParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageJson {
    name: String,
    version: String,
    license: Option<Value>,
    licenses: Vec<Value>,
    dependencies: serde_json::Map<String, Value>,
    engines: serde_json::Map<String, Value>,
    deprecated: Option<String>,
}

impl ManifestParser for PackageJsonParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "package.json"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let manifest: PackageJson = serde_json::from_str(content).map_err(|e| {
            warn!("Failed to parse package.json: {}", e);
            ParseError::InvalidSyntax(e.to_string())
        })?;

        let mut pkg_lic = license_names(manifest.license.as_ref(), &manifest.licenses);
        pkg_lic.dedup();

        Ok(DeclaredDeps {
            pkg_name: manifest.name,
            pkg_ver: manifest.version,
            pkg_lic,
            pkg_dep: dependency_entries(&manifest.dependencies),
            lang_ver: manifest
                .engines
                .get("node")
                .and_then(Value::as_str)
                .map(|v| vec![v.to_string()])
                .unwrap_or_default(),
            deprecated: manifest.deprecated,
        })
    }
}

/// Licenses from `license` (string or `{type}`), falling back to `licenses[].type`
///
/// Shared with the npm registry, whose version documents use the same fields.
pub fn license_names(license: Option<&Value>, licenses: &[Value]) -> Vec<String> {
    let type_of = |value: &Value| -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => map
                .get("type")
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
            _ => None,
        }
    };

    if let Some(name) = license.and_then(type_of) {
        return vec![name];
    }
    licenses.iter().filter_map(type_of).collect()
}

/// `{"name": "constraint"}` maps flattened to `name;constraint` entries, sorted by name
pub fn dependency_entries(dependencies: &serde_json::Map<String, Value>) -> Vec<String> {
    dependencies
        .iter()
        .map(|(name, constraint)| dep_entry(name, constraint.as_str().unwrap_or_default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_extracts_metadata_and_dependencies() {
        let content = r#"{
  "name": "my-app",
  "version": "2.1.0",
  "license": "MIT",
  "engines": { "node": ">=18" },
  "dependencies": {
    "lodash": "^4.17.21",
    "express": "~4.18.2"
  },
  "devDependencies": {
    "jest": "^29.0.0"
  }
}"#;
        let declared = PackageJsonParser::new().parse(content).unwrap();

        assert_eq!(declared.pkg_name, "my-app");
        assert_eq!(declared.pkg_ver, "2.1.0");
        assert_eq!(declared.pkg_lic, vec!["MIT".to_string()]);
        assert_eq!(declared.lang_ver, vec![">=18".to_string()]);
        assert_eq!(
            declared.pkg_dep,
            vec![
                "express;~4.18.2".to_string(),
                "lodash;^4.17.21".to_string()
            ]
        );
    }

    #[rstest]
    #[case(r#"{"license": {"type": "ISC"}}"#, vec!["ISC"])]
    #[case(r#"{"licenses": [{"type": "MIT"}, {"type": "Apache-2.0"}]}"#, vec!["MIT", "Apache-2.0"])]
    #[case(r#"{"license": ""}"#, vec![])]
    #[case(r#"{}"#, vec![])]
    fn parse_reads_legacy_license_fields(#[case] content: &str, #[case] expected: Vec<&str>) {
        let declared = PackageJsonParser::new().parse(content).unwrap();
        assert_eq!(declared.pkg_lic, expected);
    }

    #[test]
    fn parse_returns_error_for_invalid_json() {
        assert!(PackageJsonParser::new().parse("{ invalid json }").is_err());
    }
}
