//! Registry trait for fetching package metadata from various sources

#[cfg(test)]
use mockall::automock;

use crate::parser::types::Ecosystem;
use crate::version::error::RegistryError;
use crate::version::types::{PackageVersions, RegistryRecord};

/// Trait for fetching package versions and metadata from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Returns the ecosystem this implementation handles
    fn ecosystem(&self) -> Ecosystem;

    /// Fetches all versions for a package from the registry
    ///
    /// # Returns
    /// * `Ok(PackageVersions)` - List of versions, oldest first
    /// * `Err(RegistryError::NotFound)` - The registry does not know the package
    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError>;

    /// Fetches metadata for one version, or the registry's latest when `version` is `None`
    async fn fetch<'a>(
        &self,
        package_name: &str,
        version: Option<&'a str>,
    ) -> Result<RegistryRecord, RegistryError>;
}
