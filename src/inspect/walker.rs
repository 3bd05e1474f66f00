//! Dependency-closure walker
//!
//! Each work item goes through version resolution, then metadata acquisition
//! (cache, registry, VCS fallback), then enqueues its direct dependencies one
//! level deeper. Levels are processed in order; items within a level run
//! concurrently with staggered start times to avoid rate limiting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::config::WalkerConfig;
use crate::inspect::request::PackageRequest;
use crate::inspect::resolver::PackageResolver;
use crate::parser::types::{DeclaredDeps, Ecosystem};
use crate::vcs::{VcsResolver, is_repository_url};
use crate::version::cache::ResultStore;
use crate::version::error::{InspectError, RegistryError};
use crate::version::resolver::{find_latest, resolve};
use crate::version::types::{PackageResult, PackageVersions};

/// Cache key for results fetched without an explicit version
const LATEST_KEY: &str = "latest";

/// Annotation keys that mark a result as incomplete, which keeps it out of the cache
const FAILURE_KEYS: &[&str] = &["unresolved", "registry", "vcs"];

#[derive(Debug, Clone)]
struct WorkItem {
    request: PackageRequest,
    /// Levels still to descend; `None` is unbounded
    depth: Option<usize>,
    /// Lowercased names from the root to this item
    ancestors: Vec<String>,
}

impl WorkItem {
    fn root(request: PackageRequest, depth: Option<usize>) -> Self {
        Self {
            request,
            depth,
            ancestors: Vec::new(),
        }
    }

    /// Work items for the dependencies a result declared
    fn children(&self, result: &PackageResult) -> Vec<WorkItem> {
        let depth = match self.depth {
            Some(0) => return Vec::new(),
            Some(depth) => Some(depth - 1),
            None => None,
        };

        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.request.name.to_lowercase());

        result
            .pkg_dep
            .iter()
            .map(|entry| PackageRequest::from_dep_entry(entry))
            .filter(|request| {
                let cyclic = ancestors.contains(&request.name.to_lowercase());
                if cyclic {
                    debug!("Skipping {}: already on the dependency path", request.name);
                }
                !cyclic
            })
            .map(|request| WorkItem {
                request,
                depth,
                ancestors: ancestors.clone(),
            })
            .collect()
    }
}

enum Resolution {
    Exact(String),
    /// No candidates to choose from; let the registry pick its latest
    Latest,
    Unresolved(String),
}

/// Repository URL implied by a package name, e.g. Go module paths on GitHub
fn repository_url_for(name: &str) -> Option<String> {
    if is_repository_url(name) {
        Some(name.to_string())
    } else if name.starts_with("github.com/") {
        Some(format!("https://{}", name))
    } else {
        None
    }
}

fn is_cacheable(result: &PackageResult) -> bool {
    !FAILURE_KEYS.iter().any(|key| result.pkg_err.contains_key(*key))
}

/// Runs the acquisition pipeline over a dependency closure
pub struct Inspector {
    resolvers: HashMap<Ecosystem, PackageResolver>,
    store: Arc<dyn ResultStore>,
    vcs: Arc<dyn VcsResolver>,
    config: WalkerConfig,
}

impl Inspector {
    pub fn new(
        resolvers: HashMap<Ecosystem, PackageResolver>,
        store: Arc<dyn ResultStore>,
        vcs: Arc<dyn VcsResolver>,
        config: WalkerConfig,
    ) -> Self {
        Self {
            resolvers,
            store,
            vcs,
            config,
        }
    }

    fn resolver(&self, ecosystem: Ecosystem) -> Result<&PackageResolver, InspectError> {
        self.resolvers
            .get(&ecosystem)
            .ok_or_else(|| InspectError::UnsupportedEcosystem(ecosystem.to_string()))
    }

    fn stagger(&self, index: usize) -> Duration {
        Duration::from_millis(self.config.stagger_delay_ms * index as u64)
    }

    fn deadline(&self) -> Option<Instant> {
        self.config
            .timeout_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs))
    }

    /// Inspect one package and its dependency closure
    ///
    /// Results are returned root first, level by level.
    pub async fn inspect(
        &self,
        ecosystem: Ecosystem,
        request: PackageRequest,
        depth: Option<usize>,
    ) -> Result<Vec<PackageResult>, InspectError> {
        let resolver = self.resolver(ecosystem)?;
        let deadline = self.deadline();
        Ok(self
            .walk(ecosystem, resolver, vec![WorkItem::root(request, depth)], deadline)
            .await)
    }

    /// Inspect several top-level packages concurrently
    ///
    /// Identifiers use the `name`, `name;version` and `name|constraint` forms.
    /// A failure in one package is recorded in its result and never aborts
    /// the others.
    pub async fn inspect_batch(
        &self,
        ecosystem: Ecosystem,
        identifiers: &[String],
        depth: Option<usize>,
    ) -> Result<Vec<PackageResult>, InspectError> {
        self.resolver(ecosystem)?;

        let futures = identifiers.iter().enumerate().map(|(i, identifier)| {
            let delay = self.stagger(i);
            async move {
                sleep(delay).await;
                self.inspect(ecosystem, PackageRequest::parse(identifier), depth)
                    .await
                    .inspect_err(|e| error!("Failed to inspect {}: {}", identifier, e))
                    .unwrap_or_default()
            }
        });

        Ok(join_all(futures).await.into_iter().flatten().collect())
    }

    /// Report a parsed manifest and, unless `depth` is 0, walk its dependencies
    ///
    /// The manifest itself counts as the root level, so `Some(1)` resolves
    /// only the direct dependencies.
    pub async fn inspect_manifest(
        &self,
        ecosystem: Ecosystem,
        declared: DeclaredDeps,
        depth: Option<usize>,
    ) -> Result<Vec<PackageResult>, InspectError> {
        let resolver = self.resolver(ecosystem)?;

        let mut root = PackageResult::new(&declared.pkg_name);
        root.merge_declared(declared);
        root.finalize();

        let item = WorkItem::root(PackageRequest::latest(&root.pkg_name), depth);
        let children = item.children(&root);
        let mut results = vec![root];
        if !children.is_empty() {
            let deadline = self.deadline();
            results.extend(self.walk(ecosystem, resolver, children, deadline).await);
        }
        Ok(results)
    }

    async fn walk(
        &self,
        ecosystem: Ecosystem,
        resolver: &PackageResolver,
        mut level: Vec<WorkItem>,
        deadline: Option<Instant>,
    ) -> Vec<PackageResult> {
        let mut results = Vec::new();
        let chunk_size = self.config.max_concurrency.max(1);

        'levels: while !level.is_empty() {
            let mut next = Vec::new();

            for (index, chunk) in level.chunks(chunk_size).enumerate() {
                let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);
                if expired && !results.is_empty() {
                    let skipped = level.len() - index * chunk_size + next.len();
                    warn!("Deadline passed, skipping {} remaining dependencies", skipped);
                    break 'levels;
                }

                let futures = chunk.iter().enumerate().map(|(i, item)| {
                    let delay = self.stagger(i);
                    async move {
                        sleep(delay).await;
                        self.process(ecosystem, resolver, &item.request, deadline).await
                    }
                });
                let outcomes = join_all(futures).await;

                for (item, result) in chunk.iter().zip(outcomes) {
                    next.extend(item.children(&result));
                    results.push(result);
                }
            }

            level = next;
        }

        results
    }

    /// Resolve and acquire one package
    async fn process(
        &self,
        ecosystem: Ecosystem,
        resolver: &PackageResolver,
        request: &PackageRequest,
        deadline: Option<Instant>,
    ) -> PackageResult {
        let mut result = PackageResult::new(&request.name);

        if let Some(url) = request
            .constraint
            .as_deref()
            .filter(|constraint| is_repository_url(constraint))
        {
            if let Some(cached) = self.cached(ecosystem, &request.name, url) {
                return cached;
            }
            self.fill_from_vcs(ecosystem, url, &mut result, deadline).await;
            return self.finish(ecosystem, &request.name, url, result);
        }

        let version = match self.resolve_version(ecosystem, resolver, request).await {
            Ok(Resolution::Exact(version)) => Some(version),
            Ok(Resolution::Latest) => None,
            Ok(Resolution::Unresolved(message)) => {
                info!("Unresolved {}/{}: {}", ecosystem, request.name, message);
                result.annotate("unresolved", message);
                result.finalize();
                return result;
            }
            Err(e) => {
                self.registry_failure(ecosystem, &request.name, e, &mut result, deadline)
                    .await;
                result.finalize();
                return result;
            }
        };

        let cache_version = version.as_deref().unwrap_or(LATEST_KEY).to_string();
        if let Some(cached) = self.cached(ecosystem, &request.name, &cache_version) {
            return cached;
        }

        match resolver
            .registry()
            .fetch(&request.name, version.as_deref())
            .await
        {
            Ok(record) => {
                if !record.declared.pkg_name.is_empty() {
                    result.pkg_name = record.declared.pkg_name.clone();
                }
                result.merge_declared(record.declared);

                if result.license_unknown()
                    && let Some(url) = record.repository.filter(|url| is_repository_url(url))
                {
                    debug!("No license from the registry for {}, trying {}", request.name, url);
                    self.fill_from_vcs(ecosystem, &url, &mut result, deadline).await;
                }
            }
            Err(e) => {
                self.registry_failure(ecosystem, &request.name, e, &mut result, deadline)
                    .await;
            }
        }
        if result.pkg_ver.is_empty()
            && let Some(version) = version
        {
            result.pkg_ver = version;
        }

        self.finish(ecosystem, &request.name, &cache_version, result)
    }

    async fn resolve_version(
        &self,
        ecosystem: Ecosystem,
        resolver: &PackageResolver,
        request: &PackageRequest,
    ) -> Result<Resolution, RegistryError> {
        if let Some(version) = &request.version {
            return Ok(Resolution::Exact(version.clone()));
        }

        let candidates = self.candidates(ecosystem, resolver, &request.name).await?;

        let Some(raw) = request.constraint.as_deref() else {
            return Ok(find_latest(&candidates.versions, &candidates.dist_tags)
                .map(Resolution::Exact)
                .unwrap_or(Resolution::Latest));
        };

        let constraint = resolver.matcher().interpret(raw);
        debug!("Interpreted {} as {}", raw, constraint);
        Ok(match resolve(&candidates.versions, &constraint) {
            Some(version) => Resolution::Exact(version),
            None => Resolution::Unresolved(format!("no published version satisfies {}", raw)),
        })
    }

    /// Candidate versions, from the cache when fresh
    async fn candidates(
        &self,
        ecosystem: Ecosystem,
        resolver: &PackageResolver,
        package_name: &str,
    ) -> Result<PackageVersions, RegistryError> {
        match self.store.get_versions(ecosystem, package_name) {
            Ok(Some(versions)) => {
                debug!("Using cached versions for {}/{}", ecosystem, package_name);
                return Ok(versions);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read cached versions for {}/{}: {}", ecosystem, package_name, e),
        }

        let versions = resolver.registry().list_versions(package_name).await?;
        info!(
            "Fetched {} versions for {}/{}",
            versions.versions.len(),
            ecosystem,
            package_name
        );
        let _ = self
            .store
            .replace_versions(ecosystem, package_name, &versions)
            .inspect_err(|e| {
                warn!(
                    "Failed to save versions for {}/{}: {}",
                    ecosystem, package_name, e
                )
            });
        Ok(versions)
    }

    fn cached(&self, ecosystem: Ecosystem, package_name: &str, version: &str) -> Option<PackageResult> {
        match self.store.get_result(ecosystem, package_name, version) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Failed to read cache for {}/{}@{}: {}",
                    ecosystem, package_name, version, e
                );
                None
            }
        }
    }

    /// Finalize a result and store it when it is complete
    fn finish(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
        version: &str,
        mut result: PackageResult,
    ) -> PackageResult {
        result.finalize();
        if is_cacheable(&result) {
            let _ = self
                .store
                .put_result(ecosystem, package_name, version, &result)
                .inspect_err(|e| {
                    warn!(
                        "Failed to save {}/{}@{} to cache: {}",
                        ecosystem, package_name, version, e
                    )
                });
        }
        result
    }

    /// Fall back to the repository when the name points at one, else record the failure
    async fn registry_failure(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
        error: RegistryError,
        result: &mut PackageResult,
        deadline: Option<Instant>,
    ) {
        match repository_url_for(package_name) {
            Some(url) => {
                info!(
                    "Registry lookup for {}/{} failed ({}), trying {}",
                    ecosystem, package_name, error, url
                );
                self.fill_from_vcs(ecosystem, &url, result, deadline).await;
            }
            None => {
                if matches!(error, RegistryError::NotFound(_)) {
                    info!("Package not found: {}/{}", ecosystem, package_name);
                } else {
                    error!(
                        "Failed to fetch {}/{}: {}",
                        ecosystem, package_name, error
                    );
                }
                result.annotate("registry", error.to_string());
            }
        }
    }

    async fn fill_from_vcs(
        &self,
        ecosystem: Ecosystem,
        url: &str,
        result: &mut PackageResult,
        deadline: Option<Instant>,
    ) {
        match self.vcs.inspect(ecosystem, url, result, deadline).await {
            Ok(declared) => result.merge_declared(declared),
            Err(e) => {
                warn!("VCS fallback for {} failed: {}", url, e);
                result.annotate("vcs", e.to_string());
            }
        }
    }
}
