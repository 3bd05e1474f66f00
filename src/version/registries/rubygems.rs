//! RubyGems.org API registry implementation

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::parser::types::{DeclaredDeps, Ecosystem, dep_entry};
use crate::version::error::RegistryError;
use crate::version::registries::{get_checked, get_json, http_client, json_string, json_strings, sort_versions};
use crate::version::registry::Registry;
use crate::version::types::{PackageVersions, RegistryRecord};

/// Default base URL for RubyGems.org
pub const DEFAULT_BASE_URL: &str = "https://rubygems.org";

#[derive(Debug, Deserialize)]
struct GemVersion {
    number: String,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    platform: Option<String>,
}

/// Registry implementation for the RubyGems.org API
pub struct RubygemsRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl RubygemsRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn gem_versions(&self, package_name: &str) -> Result<Vec<GemVersion>, RegistryError> {
        let url = format!("{}/api/v1/versions/{}.json", self.base_url, package_name);
        debug!("Fetching RubyGems versions: {}", url);

        let response = get_checked(&self.client, &url, package_name).await?;
        response.json().await.map_err(|e| {
            warn!("Failed to parse RubyGems versions: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }

    /// Runtime dependencies as `name;requirements`
    fn runtime_dependencies(document: &Value) -> Vec<String> {
        document
            .pointer("/dependencies/runtime")
            .and_then(Value::as_array)
            .map(|deps| {
                deps.iter()
                    .filter_map(|dep| {
                        let name = json_string(dep, "/name")?;
                        let requirements = json_string(dep, "/requirements").unwrap_or_default();
                        Some(dep_entry(&name, &requirements))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for RubygemsRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for RubygemsRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Ruby
    }

    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError> {
        let gem_versions = self.gem_versions(package_name).await?;

        // Platform builds (java, x86_64-linux) repeat the same number
        let mut versions: Vec<String> = Vec::new();
        for gem in &gem_versions {
            if !versions.contains(&gem.number) {
                versions.push(gem.number.clone());
            }
        }

        let mut dist_tags = HashMap::new();
        let latest = gem_versions
            .iter()
            .filter(|g| !g.prerelease)
            .filter(|g| g.platform.as_deref().is_none_or(|p| p == "ruby"))
            .map(|g| g.number.clone());
        if let Some(latest) = sort_versions(latest.collect()).pop() {
            dist_tags.insert("latest".to_string(), latest);
        }

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
            Some(version) => format!(
                "{}/api/v2/rubygems/{}/versions/{}.json",
                self.base_url, package_name, version
            ),
            None => format!("{}/api/v1/gems/{}.json", self.base_url, package_name),
        };
        debug!("Fetching RubyGems metadata: {}", url);

        let document = get_json(&self.client, &url, package_name).await?;

        let declared = DeclaredDeps {
            pkg_name: json_string(&document, "/name").unwrap_or_else(|| package_name.to_string()),
            pkg_ver: json_string(&document, "/version")
                .or_else(|| version.map(str::to_string))
                .unwrap_or_default(),
            pkg_lic: json_strings(&document, "/licenses"),
            pkg_dep: Self::runtime_dependencies(&document),
            lang_ver: json_string(&document, "/ruby_version")
                .map(|v| vec![v])
                .unwrap_or_default(),
            deprecated: document
                .get("yanked")
                .and_then(Value::as_bool)
                .unwrap_or(false)
                .then(|| "yanked".to_string()),
        };

        let repository = ["/source_code_uri", "/homepage_uri", "/metadata/source_code_uri"]
            .iter()
            .filter_map(|pointer| json_string(&document, pointer))
            .next();

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
    async fn list_versions_collapses_platform_builds() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/versions/nokogiri.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"number": "1.16.0", "prerelease": false, "platform": "ruby"},
                    {"number": "1.16.0", "prerelease": false, "platform": "java"},
                    {"number": "1.16.0.rc1", "prerelease": true, "platform": "ruby"},
                    {"number": "1.15.5", "prerelease": false, "platform": "ruby"}
                ]"#,
            )
            .create_async()
            .await;

        let registry = RubygemsRegistry::new(&server.url());
        let result = registry.list_versions("nokogiri").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.versions.len(), 3);
        assert_eq!(result.versions.first().map(String::as_str), Some("1.15.5"));
        assert_eq!(result.dist_tags.get("latest"), Some(&"1.16.0".to_string()));
    }

    #[tokio::test]
    async fn fetch_reads_runtime_dependencies() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/rubygems/rails/versions/7.1.2.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "name": "rails",
                    "version": "7.1.2",
                    "licenses": ["MIT"],
                    "ruby_version": ">= 2.7.0",
                    "source_code_uri": "https://github.com/rails/rails/tree/v7.1.2",
                    "dependencies": {
                        "development": [{"name": "rake", "requirements": ">= 0"}],
                        "runtime": [
                            {"name": "actionpack", "requirements": "= 7.1.2"},
                            {"name": "bundler", "requirements": ">= 1.15.0"}
                        ]
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = RubygemsRegistry::new(&server.url());
        let record = registry.fetch("rails", Some("7.1.2")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.declared.pkg_lic, vec!["MIT".to_string()]);
        assert_eq!(record.declared.lang_ver, vec![">= 2.7.0".to_string()]);
        assert_eq!(
            record.declared.pkg_dep,
            vec![
                "actionpack;= 7.1.2".to_string(),
                "bundler;>= 1.15.0".to_string()
            ]
        );
        assert_eq!(
            record.repository.as_deref(),
            Some("https://github.com/rails/rails/tree/v7.1.2")
        );
    }

    #[tokio::test]
    async fn fetch_without_version_reads_gem_summary() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/gems/rack.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "name": "rack",
                    "version": "3.0.8",
                    "licenses": [],
                    "homepage_uri": "https://github.com/rack/rack",
                    "dependencies": {"runtime": []}
                }"#,
            )
            .create_async()
            .await;

        let registry = RubygemsRegistry::new(&server.url());
        let record = registry.fetch("rack", None).await.unwrap();

        assert_eq!(record.declared.pkg_ver, "3.0.8");
        assert!(record.declared.pkg_lic.is_empty());
        assert_eq!(
            record.repository.as_deref(),
            Some("https://github.com/rack/rack")
        );
    }
}
