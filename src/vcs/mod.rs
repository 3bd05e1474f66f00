//! VCS fallback: read metadata straight from a source repository
//!
//! Used when a registry misses, when a dependency constraint is itself a
//! repository URL, or when the Go scrape finds nothing.

pub mod github;
pub mod license;

pub use github::GithubResolver;

#[cfg(test)]
use mockall::automock;

use tokio::time::Instant;

use crate::parser::types::{DeclaredDeps, Ecosystem};
use crate::version::error::InspectError;
use crate::version::types::PackageResult;

/// Repository inspector
///
/// Implementations only fetch what `known` is still missing; callers merge
/// the returned fields with [`PackageResult::merge_declared`]. Waiting on a
/// rate limit stops at `deadline`.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VcsResolver: Send + Sync {
    async fn inspect(
        &self,
        ecosystem: Ecosystem,
        url: &str,
        known: &PackageResult,
        deadline: Option<Instant>,
    ) -> Result<DeclaredDeps, InspectError>;
}

/// Whether a constraint string names a repository instead of a version range
pub fn is_repository_url(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("git+")
        || text.starts_with("git@")
        || text.starts_with("git://")
        || ((text.starts_with("https://") || text.starts_with("http://"))
            && (text.contains("github.com") || text.ends_with(".git")))
}
