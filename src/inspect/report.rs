//! Output schema
//!
//! ```json
//! [{"aiohttp": {"versions": {"3.7.2": {"import_name": "...", "lang_ver": [], ...}}}}]
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use crate::version::types::PackageResult;

/// Key used for results whose version could not be determined
pub const UNKNOWN_VERSION_KEY: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub import_name: String,
    pub lang_ver: Vec<String>,
    pub pkg_lic: Vec<String>,
    pub pkg_err: IndexMap<String, String>,
    pub pkg_dep: Vec<String>,
    pub timestamp: String,
}

impl From<&PackageResult> for VersionEntry {
    fn from(result: &PackageResult) -> Self {
        Self {
            import_name: result.import_name.clone(),
            lang_ver: result.lang_ver.clone(),
            pkg_lic: result.pkg_lic.clone(),
            pkg_err: result.pkg_err.clone(),
            pkg_dep: result.pkg_dep.clone(),
            timestamp: result.timestamp.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageEntry {
    pub versions: IndexMap<String, VersionEntry>,
}

/// One `{pkg_name: {versions: ...}}` object per package, in first-seen order
///
/// Results for the same package are grouped; a repeated version keeps the
/// first result.
pub fn build_report(results: &[PackageResult]) -> Vec<IndexMap<String, PackageEntry>> {
    let mut packages: IndexMap<String, PackageEntry> = IndexMap::new();

    for result in results {
        let version_key = if result.pkg_ver.is_empty() {
            UNKNOWN_VERSION_KEY.to_string()
        } else {
            result.pkg_ver.clone()
        };
        packages
            .entry(result.pkg_name.clone())
            .or_default()
            .versions
            .entry(version_key)
            .or_insert_with(|| VersionEntry::from(result));
    }

    packages
        .into_iter()
        .map(|(name, entry)| IndexMap::from([(name, entry)]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(name: &str, version: &str, deps: &[&str]) -> PackageResult {
        PackageResult {
            import_name: name.to_string(),
            pkg_name: name.to_string(),
            pkg_ver: version.to_string(),
            pkg_lic: vec!["MIT".to_string()],
            pkg_dep: deps.iter().map(|d| d.to_string()).collect(),
            timestamp: "2023-11-14T22:13:20+00:00".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn build_report_serializes_nested_schema() {
        let report = build_report(&[result("attrs", "23.1.0", &[])]);

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!([{
                "attrs": {
                    "versions": {
                        "23.1.0": {
                            "import_name": "attrs",
                            "lang_ver": [],
                            "pkg_lic": ["MIT"],
                            "pkg_err": {},
                            "pkg_dep": [],
                            "timestamp": "2023-11-14T22:13:20+00:00"
                        }
                    }
                }
            }])
        );
    }

    #[test]
    fn build_report_groups_versions_of_the_same_package() {
        let report = build_report(&[
            result("six", "1.16.0", &[]),
            result("attrs", "23.1.0", &[]),
            result("six", "1.15.0", &[]),
            result("six", "1.16.0", &["ignored;latest"]),
        ]);

        assert_eq!(report.len(), 2);
        let six = &report[0]["six"];
        assert_eq!(
            six.versions.keys().collect::<Vec<_>>(),
            vec!["1.16.0", "1.15.0"]
        );
        assert!(six.versions["1.16.0"].pkg_dep.is_empty());
        assert!(report[1].contains_key("attrs"));
    }

    #[test]
    fn build_report_keys_missing_version_as_unknown() {
        let report = build_report(&[result("ghost", "", &[])]);
        assert!(report[0]["ghost"].versions.contains_key(UNKNOWN_VERSION_KEY));
    }
}
