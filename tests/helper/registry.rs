//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::time::Instant;

use dep_inspector::config::WalkerConfig;
use dep_inspector::inspect::{Inspector, PackageResolver};
use dep_inspector::parser::types::{DeclaredDeps, Ecosystem};
use dep_inspector::vcs::VcsResolver;
use dep_inspector::version::cache::{Cache, ResultStore};
use dep_inspector::version::error::{InspectError, RegistryError};
use dep_inspector::version::matcher::VersionMatcher;
use dep_inspector::version::matchers::{
    CratesVersionMatcher, GoVersionMatcher, NpmVersionMatcher, NugetVersionMatcher,
    PackagistVersionMatcher, PypiVersionMatcher, RubygemsVersionMatcher,
};
use dep_inspector::version::registry::Registry;
use dep_inspector::version::types::{PackageResult, PackageVersions, RegistryRecord};

/// Mock registry for testing
pub struct MockRegistry {
    ecosystem: Ecosystem,
    versions: HashMap<String, Vec<String>>,
    records: HashMap<String, DeclaredDeps>,
    fetch_latency: Duration,
    fetch_count: Arc<AtomicUsize>,
}

impl MockRegistry {
    pub fn new(ecosystem: Ecosystem) -> Self {
        Self {
            ecosystem,
            versions: HashMap::new(),
            records: HashMap::new(),
            fetch_latency: Duration::ZERO,
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_versions(mut self, package: &str, versions: Vec<&str>) -> Self {
        self.versions.insert(
            package.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Metadata returned for `package`, whatever version is requested
    pub fn with_record(mut self, package: &str, license: &str, deps: Vec<&str>) -> Self {
        self.records.insert(
            package.to_string(),
            DeclaredDeps {
                pkg_name: package.to_string(),
                pkg_lic: vec![license.to_string()],
                pkg_dep: deps.into_iter().map(|d| d.to_string()).collect(),
                ..Default::default()
            },
        );
        self
    }

    /// Make every `fetch` take `latency` before answering
    pub fn with_fetch_latency(mut self, latency: Duration) -> Self {
        self.fetch_latency = latency;
        self
    }

    /// Handle counting `fetch` calls, usable after the registry is moved
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetch_count)
    }
}

#[async_trait]
impl Registry for MockRegistry {
    fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError> {
        match self.versions.get(package_name) {
            Some(versions) => Ok(PackageVersions::new(versions.clone())),
            None => Err(RegistryError::NotFound(package_name.to_string())),
        }
    }

    async fn fetch<'a>(
        &self,
        package_name: &str,
        version: Option<&'a str>,
    ) -> Result<RegistryRecord, RegistryError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.fetch_latency).await;
        let mut declared = self
            .records
            .get(package_name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?;
        declared.pkg_ver = version.unwrap_or_default().to_string();
        Ok(RegistryRecord {
            declared,
            repository: None,
        })
    }
}

/// VCS resolver that never finds a repository
pub struct NoVcs;

#[async_trait]
impl VcsResolver for NoVcs {
    async fn inspect(
        &self,
        _ecosystem: Ecosystem,
        url: &str,
        _known: &PackageResult,
        _deadline: Option<Instant>,
    ) -> Result<DeclaredDeps, InspectError> {
        Err(InspectError::UnsupportedVcsHost(url.to_string()))
    }
}

fn matcher_for(ecosystem: Ecosystem) -> Arc<dyn VersionMatcher> {
    match ecosystem {
        Ecosystem::Python => Arc::new(PypiVersionMatcher),
        Ecosystem::JavaScript => Arc::new(NpmVersionMatcher),
        Ecosystem::Go => Arc::new(GoVersionMatcher),
        Ecosystem::Rust => Arc::new(CratesVersionMatcher),
        Ecosystem::CSharp => Arc::new(NugetVersionMatcher),
        Ecosystem::Php => Arc::new(PackagistVersionMatcher),
        Ecosystem::Ruby => Arc::new(RubygemsVersionMatcher),
    }
}

/// Create a test resolver for the given ecosystem with any registry
pub fn create_test_resolver(
    ecosystem: Ecosystem,
    registry: impl Registry + 'static,
) -> PackageResolver {
    PackageResolver::new(matcher_for(ecosystem), Arc::new(registry))
}

/// Create a test cache with pre-populated versions
pub fn create_test_cache(
    ecosystem: Ecosystem,
    versions: &[(&str, Vec<&str>)],
) -> (TempDir, Arc<Cache>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let cache = Cache::new(&db_path, 1800).unwrap();

    for (package_name, package_versions) in versions {
        cache
            .replace_versions(
                ecosystem,
                package_name,
                &PackageVersions::new(package_versions.iter().map(|v| v.to_string()).collect()),
            )
            .unwrap();
    }

    (temp_dir, Arc::new(cache))
}

/// Walker settings without stagger delays
pub fn test_walker_config() -> WalkerConfig {
    WalkerConfig {
        max_concurrency: 4,
        stagger_delay_ms: 0,
        timeout_secs: None,
    }
}

/// Create an inspector for a single ecosystem backed by `cache`
pub fn create_test_inspector(
    ecosystem: Ecosystem,
    resolver: PackageResolver,
    cache: Arc<Cache>,
) -> Inspector {
    create_test_inspector_with_config(ecosystem, resolver, cache, test_walker_config())
}

/// Same as [`create_test_inspector`] with explicit walker settings
pub fn create_test_inspector_with_config(
    ecosystem: Ecosystem,
    resolver: PackageResolver,
    cache: Arc<Cache>,
    config: WalkerConfig,
) -> Inspector {
    Inspector::new(
        HashMap::from([(ecosystem, resolver)]),
        cache,
        Arc::new(NoVcs),
        config,
    )
}
