//! crates.io API registry implementation

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::parser::types::{DeclaredDeps, Ecosystem, dep_entry, split_license_expression};
use crate::version::error::RegistryError;
use crate::version::registries::{get_checked, http_client, sort_versions};
use crate::version::registry::Registry;
use crate::version::types::{PackageVersions, RegistryRecord};

/// Default base URL for crates.io
pub const DEFAULT_BASE_URL: &str = "https://crates.io";

#[derive(Debug, Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
    #[serde(default)]
    versions: Vec<VersionInfo>,
}

#[derive(Debug, Deserialize)]
struct CrateInfo {
    max_stable_version: Option<String>,
    newest_version: Option<String>,
    repository: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: VersionInfo,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    num: String,
    #[serde(default)]
    yanked: bool,
    license: Option<String>,
    rust_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DependenciesResponse {
    dependencies: Vec<DependencyInfo>,
}

#[derive(Debug, Deserialize)]
struct DependencyInfo {
    crate_id: String,
    req: String,
    #[serde(default)]
    kind: String,
}

/// Registry implementation for the crates.io API
pub struct CratesIoRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl CratesIoRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package_name: &str,
    ) -> Result<T, RegistryError> {
        debug!("Fetching crates.io: {}", url);
        let response = get_checked(&self.client, url, package_name).await?;
        response.json().await.map_err(|e| {
            warn!("Failed to parse crates.io response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }

    async fn crate_info(&self, package_name: &str) -> Result<CrateResponse, RegistryError> {
        let url = format!("{}/api/v1/crates/{}", self.base_url, package_name);
        self.get(&url, package_name).await
    }
}

impl Default for CratesIoRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for CratesIoRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError> {
        let info = self.crate_info(package_name).await?;

        let versions = info
            .versions
            .into_iter()
            .filter(|v| !v.yanked)
            .map(|v| v.num)
            .collect();

        let mut dist_tags = HashMap::new();
        if let Some(latest) = info.krate.max_stable_version.or(info.krate.newest_version) {
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
        let info = self.crate_info(package_name).await?;
        let version = match version {
            Some(version) => version.to_string(),
            None => info
                .krate
                .max_stable_version
                .clone()
                .or_else(|| info.krate.newest_version.clone())
                .ok_or_else(|| {
                    RegistryError::InvalidResponse(format!("{} has no published version", package_name))
                })?,
        };

        let url = format!(
            "{}/api/v1/crates/{}/{}",
            self.base_url, package_name, version
        );
        let detail: VersionResponse = self.get(&url, package_name).await?;

        let url = format!(
            "{}/api/v1/crates/{}/{}/dependencies",
            self.base_url, package_name, version
        );
        let dependencies: DependenciesResponse = self.get(&url, package_name).await?;

        let declared = DeclaredDeps {
            pkg_name: package_name.to_string(),
            pkg_ver: detail.version.num,
            pkg_lic: detail
                .version
                .license
                .as_deref()
                .map(split_license_expression)
                .unwrap_or_default(),
            pkg_dep: dependencies
                .dependencies
                .iter()
                .filter(|d| d.kind.is_empty() || d.kind == "normal")
                .map(|d| dep_entry(&d.crate_id, &d.req))
                .collect(),
            lang_ver: detail.version.rust_version.into_iter().collect(),
            deprecated: detail.version.yanked.then(|| "yanked".to_string()),
        };

        Ok(RegistryRecord {
            declared,
            repository: info.krate.repository,
        })
    }
}
