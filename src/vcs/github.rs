//! GitHub repository inspection for the VCS fallback

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::InspectorConfig;
use crate::parser::parse_manifest;
use crate::parser::types::{DeclaredDeps, Ecosystem};
use crate::vcs::VcsResolver;
use crate::vcs::license::{classify, first_match, is_unclassified};
use crate::version::error::{InspectError, RegistryError};
use crate::version::registries::http_client;
use crate::version::types::PackageResult;

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// `github.com/owner/repo[.git][/tree/ref]`, also matching `git@github.com:owner/repo`
static REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[/:]([^/\s]+)/([^/\s#?]+?)(?:\.git)?(?:/tree/([^\s#?]+))?(?:[/#?]|$)")
        .expect("repository regex is valid")
});

/// Repository coordinates parsed from a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    /// Branch, tag or commit from a `/tree/<ref>` suffix
    pub git_ref: Option<String>,
}

impl RepoRef {
    /// Parse a GitHub URL; any other host is unsupported
    pub fn parse(url: &str) -> Result<Self, InspectError> {
        let caps = REPO_RE
            .captures(url.trim())
            .ok_or_else(|| InspectError::UnsupportedVcsHost(url.to_string()))?;
        Ok(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
            git_ref: caps.get(3).map(|m| m.as_str().trim_end_matches('/').to_string()),
        })
    }

    fn api_path(&self) -> String {
        format!("repos/{}/{}", self.owner, self.repo)
    }
}

/// Seconds until the rate limit resets, when the last response exhausted it
fn exhausted_for(headers: &HeaderMap, now_epoch_secs: i64) -> Option<Duration> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let remaining: u64 = header("x-ratelimit-remaining")?.trim().parse().ok()?;
    if remaining > 0 {
        return None;
    }
    let reset: i64 = header("x-ratelimit-reset")?.trim().parse().ok()?;
    Some(Duration::from_secs((reset - now_epoch_secs).max(0) as u64))
}

/// How long to back off when a response was refused for rate limiting
///
/// 429 always counts, falling back to `retry-after`; 403 only when the
/// quota headers say the limit is spent.
fn rate_limit_delay(status: StatusCode, headers: &HeaderMap, now_epoch_secs: i64) -> Option<Duration> {
    let exhausted = exhausted_for(headers, now_epoch_secs);
    match status {
        StatusCode::TOO_MANY_REQUESTS => Some(exhausted.unwrap_or_else(|| {
            headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or_default()
        })),
        StatusCode::FORBIDDEN => exhausted,
        _ => None,
    }
}

/// Shared wait gate for the GitHub API rate limit
///
/// Requests queue on the mutex while a reset is pending, so the whole
/// process sleeps once instead of every task hammering the API.
#[derive(Debug, Default)]
pub struct RateLimitGate {
    reset_at: Mutex<Option<Instant>>,
}

impl RateLimitGate {
    /// Wait out a pending reset, giving up once `deadline` passes
    pub async fn wait(&self, deadline: Option<Instant>) -> Result<(), RegistryError> {
        let mut reset_at = self.reset_at.lock().await;
        if let Some(reset) = *reset_at
            && reset > Instant::now()
        {
            warn!("GitHub API limit exhausted, waiting for reset");
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, tokio::time::sleep_until(reset))
                    .await
                    .map_err(|_| RegistryError::DeadlineExceeded)?,
                None => tokio::time::sleep_until(reset).await,
            }
        }
        *reset_at = None;
        Ok(())
    }

    /// Hold every request until `reset`
    pub async fn block_until(&self, reset: Instant) {
        let mut reset_at = self.reset_at.lock().await;
        if reset_at.is_none_or(|current| current < reset) {
            *reset_at = Some(reset);
        }
    }

    pub async fn observe(&self, headers: &HeaderMap) {
        if let Some(delay) = exhausted_for(headers, chrono::Utc::now().timestamp()) {
            self.block_until(Instant::now() + delay).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    license: Option<LicenseInfo>,
}

#[derive(Debug, Deserialize)]
struct LicenseInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// VCS fallback backed by the GitHub REST API
pub struct GithubResolver {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    config: InspectorConfig,
    gate: RateLimitGate,
}

impl GithubResolver {
    pub fn new(config: &InspectorConfig) -> Self {
        let token = config.github.resolved_token();
        if token.is_none() {
            warn!("Proceeding without GitHub authentication");
        }
        Self {
            client: http_client(),
            base_url: config.github.base_url.trim_end_matches('/').to_string(),
            token,
            config: config.clone(),
            gate: RateLimitGate::default(),
        }
    }

    fn get(&self, path: &str, git_ref: Option<&str>, media_type: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Fetching GitHub: {}", url);

        let mut request = self.client.get(url).header(ACCEPT, media_type);
        if let Some(git_ref) = git_ref {
            request = request.query(&[("ref", git_ref)]);
        }
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        request
    }

    /// Send through the rate-limit gate; 404 is `Ok(None)`
    ///
    /// A rate-limited request is retried once after the reset.
    async fn send(
        &self,
        request: RequestBuilder,
        deadline: Option<Instant>,
    ) -> Result<Option<reqwest::Response>, RegistryError> {
        let mut request = request;
        let mut retried = false;
        loop {
            let retry = if retried { None } else { request.try_clone() };
            self.gate.wait(deadline).await?;
            let response = request.send().await?;
            self.gate.observe(response.headers()).await;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if let Some(delay) = rate_limit_delay(status, response.headers(), chrono::Utc::now().timestamp()) {
                let Some(retry) = retry else {
                    return Err(RegistryError::RateLimited {
                        retry_after_secs: Some(delay.as_secs()),
                    });
                };
                warn!("GitHub API returned {}, retrying in {}s", status, delay.as_secs());
                self.gate.block_until(Instant::now() + delay).await;
                request = retry;
                retried = true;
                continue;
            }
            if !status.is_success() {
                warn!("GitHub API returned status {}", status);
                return Err(RegistryError::InvalidResponse(format!(
                    "Unexpected status: {}",
                    status
                )));
            }
            return Ok(Some(response));
        }
    }

    async fn json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        deadline: Option<Instant>,
    ) -> Result<Option<T>, RegistryError> {
        let Some(response) = self.send(request, deadline).await? else {
            return Ok(None);
        };
        response.json().await.map(Some).map_err(|e| {
            warn!("Failed to parse GitHub response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }

    /// File names at the repository root
    async fn root_listing(
        &self,
        repo: &RepoRef,
        deadline: Option<Instant>,
    ) -> Result<Vec<String>, RegistryError> {
        let path = format!("{}/contents", repo.api_path());
        let entries: Vec<ContentEntry> = self
            .json(self.get(&path, repo.git_ref.as_deref(), JSON_MEDIA_TYPE), deadline)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("{}/{}", repo.owner, repo.repo)))?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    async fn raw_file(
        &self,
        repo: &RepoRef,
        name: &str,
        deadline: Option<Instant>,
    ) -> Result<Option<String>, RegistryError> {
        let path = format!("{}/contents/{}", repo.api_path(), name);
        match self
            .send(self.get(&path, repo.git_ref.as_deref(), RAW_MEDIA_TYPE), deadline)
            .await?
        {
            Some(response) => Ok(Some(response.text().await?)),
            None => Ok(None),
        }
    }

    /// License name from GitHub's own detection
    async fn detected_license(
        &self,
        repo: &RepoRef,
        deadline: Option<Instant>,
    ) -> Result<Option<String>, RegistryError> {
        let path = format!("{}/license", repo.api_path());
        let response: Option<LicenseResponse> = self
            .json(self.get(&path, None, JSON_MEDIA_TYPE), deadline)
            .await?;
        Ok(response.and_then(|r| r.license).map(|l| l.name))
    }

    /// Latest release tag, else the latest tag
    async fn latest_tag(
        &self,
        repo: &RepoRef,
        deadline: Option<Instant>,
    ) -> Result<Option<String>, RegistryError> {
        let path = format!("{}/releases", repo.api_path());
        let releases: Vec<Release> = self
            .json(self.get(&path, None, JSON_MEDIA_TYPE), deadline)
            .await?
            .unwrap_or_default();
        if let Some(release) = releases.into_iter().next() {
            return Ok(Some(release.tag_name));
        }

        warn!("No releases found for {}, defaulting to tags", repo.api_path());
        let path = format!("{}/tags", repo.api_path());
        let tags: Vec<Tag> = self
            .json(self.get(&path, None, JSON_MEDIA_TYPE), deadline)
            .await?
            .unwrap_or_default();
        Ok(tags.into_iter().next().map(|t| t.name))
    }

    async fn licenses(
        &self,
        repo: &RepoRef,
        listing: &[String],
        deadline: Option<Instant>,
    ) -> Result<Vec<String>, RegistryError> {
        let text = match first_match(&self.config.license_files, listing) {
            Some(name) => self.raw_file(repo, name, deadline).await?.unwrap_or_default(),
            None => String::new(),
        };
        let licenses = classify(&text, &self.config.license_table);
        if !is_unclassified(&licenses) {
            return Ok(licenses);
        }
        Ok(self
            .detected_license(repo, deadline)
            .await?
            .map(|name| vec![name])
            .unwrap_or(licenses))
    }

    async fn manifest(
        &self,
        ecosystem: Ecosystem,
        repo: &RepoRef,
        listing: &[String],
        deadline: Option<Instant>,
    ) -> Result<Option<DeclaredDeps>, RegistryError> {
        let Some(name) = first_match(self.config.manifest_files_for(ecosystem), listing) else {
            debug!("No {} manifest at the root of {}", ecosystem, repo.api_path());
            return Ok(None);
        };
        let Some(content) = self.raw_file(repo, name, deadline).await? else {
            return Ok(None);
        };
        match parse_manifest(name, &content) {
            Ok(declared) => Ok(Some(declared)),
            Err(e) => {
                warn!("Failed to parse {} from {}: {}", name, repo.api_path(), e);
                Ok(None)
            }
        }
    }
}

#[async_trait::async_trait]
impl VcsResolver for GithubResolver {
    async fn inspect(
        &self,
        ecosystem: Ecosystem,
        url: &str,
        known: &PackageResult,
        deadline: Option<Instant>,
    ) -> Result<DeclaredDeps, InspectError> {
        let repo = RepoRef::parse(url)?;
        info!("Inspecting {}/{} on GitHub", repo.owner, repo.repo);

        let listing = self.root_listing(&repo, deadline).await?;
        let mut declared = DeclaredDeps {
            pkg_name: format!("github.com/{}/{}", repo.owner, repo.repo),
            ..Default::default()
        };

        if known.license_unknown() {
            declared.pkg_lic = self.licenses(&repo, &listing, deadline).await?;
        }

        if (known.pkg_dep.is_empty() || known.lang_ver.is_empty())
            && let Some(manifest) = self.manifest(ecosystem, &repo, &listing, deadline).await?
        {
            declared.pkg_dep = manifest.pkg_dep;
            declared.lang_ver = manifest.lang_ver;
        }

        if known.pkg_ver.is_empty() {
            declared.pkg_ver = match &repo.git_ref {
                Some(git_ref) => git_ref.clone(),
                None => self.latest_tag(&repo, deadline).await?.unwrap_or_default(),
            };
        }

        Ok(declared)
    }
}
