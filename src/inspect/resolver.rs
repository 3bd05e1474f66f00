//! Per-ecosystem component grouping
//!
//! Pairs the constraint grammar with the registry client of one ecosystem.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::InspectorConfig;
use crate::parser::types::Ecosystem;
use crate::version::matcher::VersionMatcher;
use crate::version::matchers::{
    CratesVersionMatcher, GoVersionMatcher, NpmVersionMatcher, NugetVersionMatcher,
    PackagistVersionMatcher, PypiVersionMatcher, RubygemsVersionMatcher,
};
use crate::version::registries::{
    CratesIoRegistry, GoPkgsiteRegistry, NpmRegistry, NugetRegistry, PackagistRegistry,
    PypiRegistry, RubygemsRegistry, crates_io, go_pkgsite, npm, nuget, packagist, pypi, rubygems,
};
use crate::version::registry::Registry;

/// Groups the components needed to resolve packages of one ecosystem
pub struct PackageResolver {
    matcher: Arc<dyn VersionMatcher>,
    registry: Arc<dyn Registry>,
}

impl PackageResolver {
    pub fn new(matcher: Arc<dyn VersionMatcher>, registry: Arc<dyn Registry>) -> Self {
        Self { matcher, registry }
    }

    /// Get the constraint interpreter for this ecosystem
    pub fn matcher(&self) -> &Arc<dyn VersionMatcher> {
        &self.matcher
    }

    /// Get the registry for fetching versions and metadata
    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }
}

/// Create resolvers for every enabled ecosystem
pub fn create_default_resolvers(config: &InspectorConfig) -> HashMap<Ecosystem, PackageResolver> {
    let mut resolvers = HashMap::new();

    for ecosystem in Ecosystem::ALL {
        let registry_config = config.registries.get(ecosystem);
        if !registry_config.enabled {
            info!("Registry for {} disabled by configuration", ecosystem);
            continue;
        }
        let base_url = registry_config.base_url.as_deref();

        let resolver = match ecosystem {
            Ecosystem::Python => PackageResolver::new(
                Arc::new(PypiVersionMatcher),
                Arc::new(PypiRegistry::new(base_url.unwrap_or(pypi::DEFAULT_BASE_URL))),
            ),
            Ecosystem::JavaScript => PackageResolver::new(
                Arc::new(NpmVersionMatcher),
                Arc::new(NpmRegistry::new(base_url.unwrap_or(npm::DEFAULT_BASE_URL))),
            ),
            Ecosystem::Go => PackageResolver::new(
                Arc::new(GoVersionMatcher),
                Arc::new(GoPkgsiteRegistry::new(
                    base_url.unwrap_or(go_pkgsite::DEFAULT_BASE_URL),
                )),
            ),
            Ecosystem::Rust => PackageResolver::new(
                Arc::new(CratesVersionMatcher),
                Arc::new(CratesIoRegistry::new(
                    base_url.unwrap_or(crates_io::DEFAULT_BASE_URL),
                )),
            ),
            Ecosystem::CSharp => PackageResolver::new(
                Arc::new(NugetVersionMatcher),
                Arc::new(NugetRegistry::new(base_url.unwrap_or(nuget::DEFAULT_BASE_URL))),
            ),
            Ecosystem::Php => PackageResolver::new(
                Arc::new(PackagistVersionMatcher),
                Arc::new(PackagistRegistry::new(
                    base_url.unwrap_or(packagist::DEFAULT_BASE_URL),
                )),
            ),
            Ecosystem::Ruby => PackageResolver::new(
                Arc::new(RubygemsVersionMatcher),
                Arc::new(RubygemsRegistry::new(
                    base_url.unwrap_or(rubygems::DEFAULT_BASE_URL),
                )),
            ),
        };
        resolvers.insert(ecosystem, resolver);
    }

    resolvers
}
