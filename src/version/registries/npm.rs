//! npm registry API implementation

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::parser::package_json::{dependency_entries, license_names};
use crate::parser::types::{DeclaredDeps, Ecosystem};
use crate::version::error::RegistryError;
use crate::version::registries::{get_json, http_client, json_string, sort_versions};
use crate::version::registry::Registry;
use crate::version::types::{PackageVersions, RegistryRecord};

/// Default base URL for npm registry
pub const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Registry implementation for npm registry API
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }

    async fn packument(&self, package_name: &str) -> Result<Value, RegistryError> {
        let url = format!(
            "{}/{}",
            self.base_url,
            Self::encode_package_name(package_name)
        );
        debug!("Fetching npm packument: {}", url);
        get_json(&self.client, &url, package_name).await
    }

    /// Version document for `version`, or for the `latest` dist-tag
    async fn version_document(
        &self,
        package_name: &str,
        version: Option<&str>,
    ) -> Result<Value, RegistryError> {
        // The per-version endpoint does not accept scoped names
        if let Some(version) = version
            && !package_name.starts_with('@')
        {
            let url = format!("{}/{}/{}", self.base_url, package_name, version);
            debug!("Fetching npm version document: {}", url);
            return get_json(&self.client, &url, package_name).await;
        }

        let mut packument = self.packument(package_name).await?;
        let version = match version {
            Some(version) => version.to_string(),
            None => json_string(&packument, "/dist-tags/latest").ok_or_else(|| {
                warn!("npm package {} has no latest dist-tag", package_name);
                RegistryError::InvalidResponse("missing dist-tags.latest".to_string())
            })?,
        };

        packument
            .get_mut("versions")
            .and_then(|versions| versions.get_mut(&version))
            .map(Value::take)
            .ok_or_else(|| RegistryError::NotFound(format!("{}@{}", package_name, version)))
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::JavaScript
    }

    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError> {
        let packument = self.packument(package_name).await?;

        let versions: Vec<String> = packument
            .get("versions")
            .and_then(Value::as_object)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default();

        let dist_tags: HashMap<String, String> = packument
            .get("dist-tags")
            .and_then(Value::as_object)
            .map(|tags| {
                tags.iter()
                    .filter_map(|(tag, v)| v.as_str().map(|v| (tag.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        // Sort versions (lowest first, highest last)
        Ok(PackageVersions::with_dist_tags(
            sort_versions(versions),
            dist_tags,
        ))
    }

    async fn fetch<'a>(
        &self,
        package_name: &str,
        version: Option<&'a str>,
    ) -> Result<RegistryRecord, RegistryError> {
        let document = self.version_document(package_name, version).await?;

        let licenses = document
            .get("licenses")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let dependencies = document
            .get("dependencies")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let declared = DeclaredDeps {
            pkg_name: json_string(&document, "/name").unwrap_or_else(|| package_name.to_string()),
            pkg_ver: json_string(&document, "/version")
                .or_else(|| version.map(str::to_string))
                .unwrap_or_default(),
            pkg_lic: license_names(document.get("license"), &licenses),
            pkg_dep: dependency_entries(&dependencies),
            lang_ver: json_string(&document, "/engines/node")
                .map(|v| vec![v])
                .unwrap_or_default(),
            deprecated: json_string(&document, "/deprecated"),
        };

        // repository may be an object with a url or a bare string
        let repository = json_string(&document, "/repository/url")
            .or_else(|| json_string(&document, "/repository"))
            .or_else(|| json_string(&document, "/homepage"));

        Ok(RegistryRecord {
            declared,
            repository,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn list_versions_returns_versions_sorted_by_semver() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lodash")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "name": "lodash",
                    "dist-tags": {"latest": "4.17.21"},
                    "versions": {
                        "4.17.21": {},
                        "4.17.19": {},
                        "4.17.20": {}
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let result = registry.list_versions("lodash").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.versions,
            vec![
                "4.17.19".to_string(),
                "4.17.20".to_string(),
                "4.17.21".to_string()
            ]
        );
        assert_eq!(result.dist_tags.get("latest"), Some(&"4.17.21".to_string()));
    }

    #[tokio::test]
    async fn list_versions_returns_not_found_for_nonexistent_package() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/nonexistent-package")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Not found"}"#)
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let result = registry.list_versions("nonexistent-package").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_reads_version_document() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/express/4.18.2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "name": "express",
                    "version": "4.18.2",
                    "license": "MIT",
                    "engines": {"node": ">= 0.10.0"},
                    "repository": {"type": "git", "url": "git+https://github.com/expressjs/express.git"},
                    "dependencies": {"accepts": "~1.3.8", "body-parser": "1.20.1"}
                }"#,
            )
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let record = registry.fetch("express", Some("4.18.2")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.declared.pkg_ver, "4.18.2");
        assert_eq!(record.declared.pkg_lic, vec!["MIT".to_string()]);
        assert_eq!(
            record.declared.pkg_dep,
            vec![
                "accepts;~1.3.8".to_string(),
                "body-parser;1.20.1".to_string()
            ]
        );
        assert_eq!(record.declared.lang_ver, vec![">= 0.10.0".to_string()]);
        assert_eq!(
            record.repository.as_deref(),
            Some("git+https://github.com/expressjs/express.git")
        );
    }

    #[tokio::test]
    async fn fetch_without_version_uses_latest_dist_tag() {
        let mut server = Server::new_async().await;

        // Scoped packages use URL encoding: @types/node -> @types%2Fnode
        let mock = server
            .mock("GET", "/@types%2Fnode")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "name": "@types/node",
                    "dist-tags": {"latest": "20.0.0"},
                    "versions": {
                        "20.0.0": {
                            "name": "@types/node",
                            "version": "20.0.0",
                            "licenses": [{"type": "MIT"}],
                            "deprecated": "use a newer release"
                        },
                        "18.0.0": {"name": "@types/node", "version": "18.0.0"}
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let record = registry.fetch("@types/node", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.declared.pkg_ver, "20.0.0");
        assert_eq!(record.declared.pkg_lic, vec!["MIT".to_string()]);
        assert_eq!(
            record.declared.deprecated.as_deref(),
            Some("use a newer release")
        );
        assert!(record.declared.pkg_dep.is_empty());
    }
}
