//! package-lock.json parser
//!
//! The root project's runtime dependencies are reported pinned to the
//! version npm locked them at. Lockfile v2/v3 keep the root under
//! `packages[""]` and installs under `packages["node_modules/<name>"]`;
//! v1 only has the nested `dependencies` tree, whose non-dev top level is
//! used instead.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::parser::package_json::license_names;
use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PackageLock {
    name: String,
    version: String,
    packages: BTreeMap<String, LockedPackage>,
    dependencies: BTreeMap<String, LockedDependency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LockedPackage {
    version: Option<String>,
    license: Option<Value>,
    dependencies: BTreeMap<String, String>,
    engines: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LockedDependency {
    version: String,
    dev: bool,
}

/// Parser for package-lock.json files
pub struct PackageLockParser;

impl ManifestParser for PackageLockParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "package-lock.json"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let lock: PackageLock = serde_json::from_str(content).map_err(|e| {
            warn!("Failed to parse package-lock.json: {}", e);
            ParseError::InvalidSyntax(e.to_string())
        })?;

        let mut declared = DeclaredDeps {
            pkg_name: lock.name.clone(),
            pkg_ver: lock.version.clone(),
            ..Default::default()
        };

        match lock.packages.get("") {
            Some(root) => {
                if let Some(version) = &root.version {
                    declared.pkg_ver = version.clone();
                }
                declared.pkg_lic = license_names(root.license.as_ref(), &[]);
                declared.lang_ver.extend(
                    root.engines
                        .get("node")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                );
                declared.pkg_dep = root
                    .dependencies
                    .iter()
                    .map(|(name, range)| {
                        let locked = lock
                            .packages
                            .get(&format!("node_modules/{}", name))
                            .and_then(|p| p.version.as_deref());
                        dep_entry(name, locked.unwrap_or(range.as_str()))
                    })
                    .collect();
            }
            None => {
                declared.pkg_dep = lock
                    .dependencies
                    .iter()
                    .filter(|(_, dep)| !dep.dev)
                    .map(|(name, dep)| dep_entry(name, &dep.version))
                    .collect();
            }
        }

        Ok(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pins_root_dependencies_from_v3_lockfile() {
        let content = r#"{
            "name": "my-app",
            "version": "1.2.0",
            "lockfileVersion": 3,
            "packages": {
                "": {
                    "name": "my-app",
                    "version": "1.2.0",
                    "license": "MIT",
                    "dependencies": {"express": "^4.18.0", "left-pad": "^1.3.0"},
                    "devDependencies": {"jest": "^29.0.0"},
                    "engines": {"node": ">=18"}
                },
                "node_modules/express": {"version": "4.18.2"},
                "node_modules/jest": {"version": "29.7.0", "dev": true},
                "node_modules/express/node_modules/debug": {"version": "2.6.9"}
            }
        }"#;
        let declared = PackageLockParser.parse(content).unwrap();

        assert_eq!(declared.pkg_name, "my-app");
        assert_eq!(declared.pkg_ver, "1.2.0");
        assert_eq!(declared.pkg_lic, vec!["MIT".to_string()]);
        assert_eq!(declared.lang_ver, vec![">=18".to_string()]);
        assert_eq!(
            declared.pkg_dep,
            vec!["express;4.18.2".to_string(), "left-pad;^1.3.0".to_string()]
        );
    }

    #[test]
    fn parse_reads_top_level_of_v1_lockfile() {
        let content = r#"{
            "name": "legacy",
            "version": "0.1.0",
            "lockfileVersion": 1,
            "dependencies": {
                "lodash": {"version": "4.17.21"},
                "mocha": {"version": "10.2.0", "dev": true}
            }
        }"#;
        let declared = PackageLockParser.parse(content).unwrap();

        assert_eq!(declared.pkg_name, "legacy");
        assert_eq!(declared.pkg_dep, vec!["lodash;4.17.21".to_string()]);
    }
}
