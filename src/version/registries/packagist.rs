//! Packagist (Composer) registry implementation

use serde_json::Value;
use tracing::debug;

use crate::parser::composer_json::{abandoned_note, license_list, requirements};
use crate::parser::types::Ecosystem;
use crate::version::error::RegistryError;
use crate::version::registries::{get_json, http_client, json_string, sort_versions};
use crate::version::registry::Registry;
use crate::version::semver::{Version, find_semantic_max};
use crate::version::types::{PackageVersions, RegistryRecord};

/// Default base URL for Packagist
pub const DEFAULT_BASE_URL: &str = "https://packagist.org";

/// Registry implementation for the Packagist package API
pub struct PackagistRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl PackagistRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn package_document(&self, package_name: &str) -> Result<Value, RegistryError> {
        let url = format!("{}/packages/{}.json", self.base_url, package_name);
        debug!("Fetching Packagist package: {}", url);
        get_json(&self.client, &url, package_name).await
    }

    /// Release versions, excluding `dev-*` branch aliases
    fn release_versions(document: &Value) -> Vec<String> {
        document
            .pointer("/package/versions")
            .and_then(Value::as_object)
            .map(|versions| {
                versions
                    .keys()
                    .filter(|v| !v.starts_with("dev-") && !v.ends_with("-dev"))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find a version entry, tolerating a missing or extra `v` prefix
    fn version_entry<'a>(document: &'a Value, version: &str) -> Option<(String, &'a Value)> {
        let versions = document.pointer("/package/versions")?.as_object()?;
        let bare = version.strip_prefix('v').unwrap_or(version);
        [version.to_string(), bare.to_string(), format!("v{}", bare)]
            .into_iter()
            .find_map(|key| versions.get(&key).map(|entry| (key, entry)))
    }
}

impl Default for PackagistRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for PackagistRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }

    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError> {
        let document = self.package_document(package_name).await?;
        Ok(PackageVersions::new(sort_versions(Self::release_versions(
            &document,
        ))))
    }

    async fn fetch<'a>(
        &self,
        package_name: &str,
        version: Option<&'a str>,
    ) -> Result<RegistryRecord, RegistryError> {
        let document = self.package_document(package_name).await?;

        let version = match version {
            Some(version) => version.to_string(),
            None => {
                let releases = Self::release_versions(&document);
                let stable: Vec<String> = releases
                    .iter()
                    .filter(|v| !Version::parse(v).is_prerelease())
                    .cloned()
                    .collect();
                find_semantic_max(&stable)
                    .or_else(|| find_semantic_max(&releases))
                    .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?
            }
        };

        let (version_key, entry) = Self::version_entry(&document, &version)
            .ok_or_else(|| RegistryError::NotFound(format!("{}@{}", package_name, version)))?;

        let require = entry
            .get("require")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let mut declared = requirements(&require);
        declared.pkg_name = package_name.to_string();
        declared.pkg_ver = version_key;
        declared.pkg_lic = license_list(entry.get("license"));
        declared.deprecated = abandoned_note(document.pointer("/package/abandoned"));

        let repository = json_string(&document, "/package/repository")
            .or_else(|| json_string(entry, "/source/url"));

        Ok(RegistryRecord {
            declared,
            repository,
        })
    }
}
