//! PyPI registry client for fetching Python package metadata

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::parser::requirements_txt::requirement_entry;
use crate::parser::types::{DeclaredDeps, Ecosystem, license_classifiers};
use crate::version::error::RegistryError;
use crate::version::registries::{
    get_json, http_client, json_string, json_strings, sort_versions,
};
use crate::version::registry::Registry;
use crate::version::types::{PackageVersions, RegistryRecord};

/// Default base URL for PyPI
pub const DEFAULT_BASE_URL: &str = "https://pypi.org";

/// PyPI registry client
pub struct PypiRegistry {
    client: Client,
    base_url: String,
}

impl Default for PypiRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl PypiRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `info.license`, else the last segment of each `License ::` classifier
    fn licenses(document: &Value) -> Vec<String> {
        if let Some(license) = json_string(document, "/info/license") {
            return vec![license];
        }
        license_classifiers(json_strings(document, "/info/classifiers").iter().map(String::as_str))
    }

    /// First GitHub-looking URL among the advertised project links
    fn repository(document: &Value) -> Option<String> {
        let project_urls = document
            .pointer("/info/project_urls")
            .and_then(Value::as_object)
            .map(|urls| {
                urls.values()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        ["/info/project_urls/Source", "/info/home_page"]
            .iter()
            .filter_map(|pointer| json_string(document, pointer))
            .chain(project_urls)
            .find(|url| url.contains("github.com"))
    }
}

#[async_trait]
impl Registry for PypiRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError> {
        let url = format!("{}/pypi/{}/json", self.base_url, package_name);
        debug!("Fetching PyPI package: {}", url);

        let document = get_json(&self.client, &url, package_name).await?;

        let versions: Vec<String> = document
            .pointer("/releases")
            .and_then(Value::as_object)
            .map(|releases| releases.keys().cloned().collect())
            .unwrap_or_default();

        // PyPI's own notion of latest excludes prereleases
        let mut dist_tags = HashMap::new();
        if let Some(latest) = json_string(&document, "/info/version") {
            dist_tags.insert("latest".to_string(), latest);
        }

        debug!(
            "Found {} versions for package {}",
            versions.len(),
            package_name
        );

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
        let url = match version {
            Some(version) => format!("{}/pypi/{}/{}/json", self.base_url, package_name, version),
            None => format!("{}/pypi/{}/json", self.base_url, package_name),
        };
        debug!("Fetching PyPI metadata: {}", url);

        let document = get_json(&self.client, &url, package_name).await?;

        let declared = DeclaredDeps {
            pkg_name: json_string(&document, "/info/name").unwrap_or_else(|| package_name.to_string()),
            pkg_ver: json_string(&document, "/info/version")
                .or_else(|| version.map(str::to_string))
                .unwrap_or_default(),
            pkg_lic: Self::licenses(&document),
            pkg_dep: json_strings(&document, "/info/requires_dist")
                .iter()
                .filter_map(|line| requirement_entry(line))
                .collect(),
            lang_ver: json_string(&document, "/info/requires_python")
                .map(|v| vec![v])
                .unwrap_or_default(),
            deprecated: json_string(&document, "/info/yanked_reason"),
        };

        Ok(RegistryRecord {
            repository: Self::repository(&document),
            declared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn list_versions_returns_sorted_versions_and_latest_tag() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/requests/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {"version": "2.31.0"},
                    "releases": {"2.31.0": [], "2.4.0": [], "2.28.1": [], "3.0.0a1": []}
                }"#,
            )
            .create_async()
            .await;

        let registry = PypiRegistry::new(&server.url());
        let result = registry.list_versions("requests").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.versions,
            vec![
                "2.4.0".to_string(),
                "2.28.1".to_string(),
                "2.31.0".to_string(),
                "3.0.0a1".to_string()
            ]
        );
        assert_eq!(
            result.dist_tags.get("latest"),
            Some(&"2.31.0".to_string())
        );
    }

    #[tokio::test]
    async fn fetch_extracts_metadata_for_version() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pypi/aiohttp/3.7.2/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {
                        "name": "aiohttp",
                        "version": "3.7.2",
                        "license": "Apache 2",
                        "requires_python": ">=3.6",
                        "home_page": "https://github.com/aio-libs/aiohttp",
                        "requires_dist": [
                            "attrs (>=17.3.0)",
                            "chardet (<4.0,>=2.0)",
                            "idna-ssl (>=1.0) ; python_version < \"3.7\"",
                            "aiodns ; extra == 'speedups'"
                        ]
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = PypiRegistry::new(&server.url());
        let record = registry.fetch("aiohttp", Some("3.7.2")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.declared.pkg_name, "aiohttp");
        assert_eq!(record.declared.pkg_ver, "3.7.2");
        assert_eq!(record.declared.pkg_lic, vec!["Apache 2".to_string()]);
        assert_eq!(record.declared.lang_ver, vec![">=3.6".to_string()]);
        assert_eq!(
            record.declared.pkg_dep,
            vec![
                "attrs;>=17.3.0".to_string(),
                "chardet;<4.0, >=2.0".to_string(),
                "idna-ssl;>=1.0".to_string(),
            ]
        );
        assert_eq!(
            record.repository.as_deref(),
            Some("https://github.com/aio-libs/aiohttp")
        );
    }

    #[tokio::test]
    async fn fetch_falls_back_to_license_classifiers() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/flask/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "info": {
                        "name": "Flask",
                        "version": "3.0.0",
                        "license": "",
                        "classifiers": [
                            "Framework :: Flask",
                            "License :: OSI Approved :: BSD License"
                        ]
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = PypiRegistry::new(&server.url());
        let record = registry.fetch("flask", None).await.unwrap();

        assert_eq!(record.declared.pkg_lic, vec!["BSD License".to_string()]);
        assert_eq!(record.declared.pkg_ver, "3.0.0");
    }

    #[tokio::test]
    async fn fetch_returns_not_found_for_unknown_package() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/nonexistent-package-xyz/json")
            .with_status(404)
            .create_async()
            .await;

        let registry = PypiRegistry::new(&server.url());
        let result = registry.fetch("nonexistent-package-xyz", None).await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }
}
