//! NuGet flat-container registry implementation

use serde::Deserialize;
use tracing::{debug, warn};

use crate::parser::nuspec::NuspecParser;
use crate::parser::types::Ecosystem;
use crate::version::error::RegistryError;
use crate::version::registries::{get_checked, http_client, sort_versions};
use crate::version::registry::Registry;
use crate::version::semver::{Version, find_semantic_max};
use crate::version::types::{PackageVersions, RegistryRecord};

/// Default base URL for the NuGet v3 API
pub const DEFAULT_BASE_URL: &str = "https://api.nuget.org";

#[derive(Debug, Deserialize)]
struct VersionIndex {
    versions: Vec<String>,
}

/// Registry implementation for nuget.org
pub struct NugetRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NugetRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Highest stable version, or the highest overall when only prereleases exist
    fn latest_stable(versions: &[String]) -> Option<String> {
        let stable: Vec<String> = versions
            .iter()
            .filter(|v| !Version::parse(v).is_prerelease())
            .cloned()
            .collect();
        find_semantic_max(&stable).or_else(|| find_semantic_max(versions))
    }
}

impl Default for NugetRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for NugetRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::CSharp
    }

    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError> {
        // Flat-container ids are lowercase
        let id = package_name.to_lowercase();
        let url = format!("{}/v3-flatcontainer/{}/index.json", self.base_url, id);
        debug!("Fetching NuGet versions: {}", url);

        let response = get_checked(&self.client, &url, package_name).await?;
        let index: VersionIndex = response.json().await.map_err(|e| {
            warn!("Failed to parse NuGet version index: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(PackageVersions::new(sort_versions(index.versions)))
    }

    async fn fetch<'a>(
        &self,
        package_name: &str,
        version: Option<&'a str>,
    ) -> Result<RegistryRecord, RegistryError> {
        let version = match version {
            Some(version) => version.to_lowercase(),
            None => {
                let versions = self.list_versions(package_name).await?;
                Self::latest_stable(&versions.versions)
                    .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?
                    .to_lowercase()
            }
        };

        let id = package_name.to_lowercase();
        let url = format!(
            "{}/v3-flatcontainer/{}/{}/{}.nuspec",
            self.base_url, id, version, id
        );
        debug!("Fetching NuGet nuspec: {}", url);

        let response = get_checked(&self.client, &url, package_name).await?;
        let body = response.text().await?;

        let document = NuspecParser::read(&body).map_err(|e| {
            warn!("Failed to parse nuspec for {}: {}", package_name, e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(RegistryRecord {
            declared: document.declared,
            repository: document.repository,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn list_versions_reads_flat_container_index() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v3-flatcontainer/newtonsoft.json/index.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"versions": ["13.0.1", "9.0.1", "13.0.3", "13.0.4-beta1"]}"#)
            .create_async()
            .await;

        let registry = NugetRegistry::new(&server.url());
        let result = registry.list_versions("Newtonsoft.Json").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result.versions,
            vec![
                "9.0.1".to_string(),
                "13.0.1".to_string(),
                "13.0.3".to_string(),
                "13.0.4-beta1".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn fetch_without_version_reads_latest_stable_nuspec() {
        let mut server = Server::new_async().await;
        let _index = server
            .mock("GET", "/v3-flatcontainer/newtonsoft.json/index.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"versions": ["13.0.3", "13.0.4-beta1"]}"#)
            .create_async()
            .await;
        let nuspec = server
            .mock(
                "GET",
                "/v3-flatcontainer/newtonsoft.json/13.0.3/newtonsoft.json.nuspec",
            )
            .with_status(200)
            .with_body(
                r#"<package><metadata>
                    <id>Newtonsoft.Json</id>
                    <version>13.0.3</version>
                    <license type="expression">MIT</license>
                    <repository type="git" url="https://github.com/JamesNK/Newtonsoft.Json" />
                </metadata></package>"#,
            )
            .create_async()
            .await;

        let registry = NugetRegistry::new(&server.url());
        let record = registry.fetch("Newtonsoft.Json", None).await.unwrap();

        nuspec.assert_async().await;
        assert_eq!(record.declared.pkg_name, "Newtonsoft.Json");
        assert_eq!(record.declared.pkg_ver, "13.0.3");
        assert_eq!(record.declared.pkg_lic, vec!["MIT".to_string()]);
        assert_eq!(
            record.repository.as_deref(),
            Some("https://github.com/JamesNK/Newtonsoft.Json")
        );
    }

    #[tokio::test]
    async fn fetch_returns_not_found_for_unknown_version() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v3-flatcontainer/missing/1.0.0/missing.nuspec")
            .with_status(404)
            .create_async()
            .await;

        let registry = NugetRegistry::new(&server.url());
        let result = registry.fetch("Missing", Some("1.0.0")).await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }
}
