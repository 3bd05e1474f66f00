//! pkg.go.dev scraper for Go module metadata
//!
//! pkg.go.dev has no JSON API, so package pages are read as HTML:
//! - the header details block carries `Version: ...` and `License: ...` labels
//! - `?tab=imports` lists imported packages as `Imports-listItem` entries
//! - `?tab=versions` lists published versions as `Version-tag` entries
//!
//! Redirects are handled by hand so the requested `@version` survives
//! moves such as `/http` -> `/net/http`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use tracing::{debug, warn};

use crate::parser::types::{DeclaredDeps, Ecosystem, dep_entry};
use crate::version::error::RegistryError;
use crate::version::registries::{client_builder, sort_versions};
use crate::version::registry::Registry;
use crate::version::types::{PackageVersions, RegistryRecord};

/// Default base URL for pkg.go.dev
pub const DEFAULT_BASE_URL: &str = "https://pkg.go.dev";

const MAX_REDIRECTS: usize = 5;

/// `Label: value` pairs inside the header details text
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^ \n:]+): ([- ,.\w]+)").expect("label regex is valid"));
static HEADER_DETAILS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="go-Main-headerDetails"[^>]*>(.*?)</div>"#)
        .expect("header details regex is valid")
});
static DETAIL_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="go-Main-headerDetailItem"[^>]*>(.*?)</span>\s*(?:<span|$)"#)
        .expect("detail item regex is valid")
});
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="Imports-listItem"[^>]*>(.*?)</li>"#).expect("import regex is valid")
});
static VERSION_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="Version-tag"[^>]*>(.*?)</"#).expect("version tag regex is valid")
});
static REPOSITORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="UnitMeta-repo"[^>]*>\s*<a[^>]*href="([^"]+)""#)
        .expect("repository regex is valid")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));
static SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("space regex is valid"));

/// Build the package page URL, e.g. `https://pkg.go.dev/bufio@go1.17.6`
pub fn package_url(base_url: &str, package_name: &str, version: Option<&str>) -> String {
    let base_url = base_url.trim_end_matches('/');
    match version {
        Some(version) => format!("{}/{}@{}", base_url, package_name, version),
        None => format!("{}/{}", base_url, package_name),
    }
}

/// Visible text of an HTML fragment with whitespace collapsed
fn text_content(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, "");
    SPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Labeled values from the header details block
///
/// Each detail item is read on its own so values never run into the next label.
fn header_details(page: &str) -> HashMap<String, String> {
    let Some(block) = HEADER_DETAILS_RE.captures(page) else {
        return HashMap::new();
    };

    let mut items: Vec<String> = DETAIL_ITEM_RE
        .captures_iter(&block[1])
        .map(|caps| text_content(&caps[1]))
        .collect();
    if items.is_empty() {
        items.push(text_content(&block[1]));
    }

    let mut details = HashMap::new();
    for item in items {
        for caps in LABEL_RE.captures_iter(&item) {
            let value = caps[2].trim();
            if !value.is_empty() {
                details
                    .entry(caps[1].to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
    }
    details
}

fn list_items(re: &Regex, page: &str) -> Vec<String> {
    re.captures_iter(page)
        .map(|caps| text_content(&caps[1]))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Re-apply `@version` to a redirect target that dropped it
fn redirect_target(base_url: &str, location: &str, version: Option<&str>) -> String {
    let absolute = if location.starts_with('/') {
        format!("{}{}", base_url, location)
    } else {
        location.to_string()
    };

    let Some(version) = version else {
        return absolute;
    };
    let (path, query) = match absolute.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (absolute.as_str(), None),
    };
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    if last_segment.contains('@') {
        return absolute;
    }

    match query {
        Some(query) => format!("{}@{}?{}", path, version, query),
        None => format!("{}@{}", path, version),
    }
}

/// Registry implementation scraping pkg.go.dev
pub struct GoPkgsiteRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl GoPkgsiteRegistry {
    pub fn new(base_url: &str) -> Self {
        let client = client_builder()
            .redirect(Policy::none())
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build pkg.go.dev client, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a page, following redirects with the version re-applied
    ///
    /// Returns `None` for any final status other than 200.
    async fn page(&self, url: &str, version: Option<&str>) -> Result<Option<String>, RegistryError> {
        let mut url = url.to_string();

        for _ in 0..=MAX_REDIRECTS {
            debug!("Fetching pkg.go.dev page: {}", url);
            let response = self.client.get(&url).send().await?;
            let status = response.status();

            if status.is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                else {
                    warn!("Redirect without location from {}", url);
                    return Ok(None);
                };
                url = redirect_target(&self.base_url, location, version);
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(RegistryError::RateLimited {
                    retry_after_secs: None,
                });
            }

            if status != StatusCode::OK {
                debug!("pkg.go.dev returned {} for {}", status, url);
                return Ok(None);
            }

            return Ok(Some(response.text().await?));
        }

        warn!("Too many redirects while fetching {}", url);
        Ok(None)
    }
}

impl Default for GoPkgsiteRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl Registry for GoPkgsiteRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    async fn list_versions(&self, package_name: &str) -> Result<PackageVersions, RegistryError> {
        let url = format!("{}?tab=versions", package_url(&self.base_url, package_name, None));
        let page = self
            .page(&url, None)
            .await?
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?;

        let mut versions: Vec<String> = Vec::new();
        for version in list_items(&VERSION_TAG_RE, &page) {
            if !versions.contains(&version) {
                versions.push(version);
            }
        }

        Ok(PackageVersions::new(sort_versions(versions)))
    }

    async fn fetch<'a>(
        &self,
        package_name: &str,
        version: Option<&'a str>,
    ) -> Result<RegistryRecord, RegistryError> {
        let url = package_url(&self.base_url, package_name, version);
        let page = self
            .page(&url, version)
            .await?
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?;
        let details = header_details(&page);

        let imports_url = format!(
            "{}?tab=imports",
            package_url(&self.base_url, package_name, version)
        );
        let imports = self
            .page(&imports_url, version)
            .await?
            .map(|page| list_items(&IMPORT_RE, &page))
            .unwrap_or_default();

        let declared = DeclaredDeps {
            pkg_name: package_name.to_string(),
            pkg_ver: details
                .get("Version")
                .cloned()
                .or_else(|| version.map(str::to_string))
                .unwrap_or_default(),
            pkg_lic: details
                .get("License")
                .map(|license| {
                    license
                        .split(',')
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            pkg_dep: imports.iter().map(|import| dep_entry(import, "")).collect(),
            ..Default::default()
        };

        let repository = REPOSITORY_RE
            .captures(&page)
            .map(|caps| caps[1].to_string())
            .or_else(|| {
                package_name
                    .starts_with("github.com/")
                    .then(|| format!("https://{}", package_name))
            });

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
    use rstest::rstest;

    const BUFIO_PAGE: &str = r#"<html><body>
<nav class="go-Main-headerBreadcrumb">Standard library bufio</nav>
<div class="go-Main-headerDetails">
  <span class="go-Main-headerDetailItem" data-test-id="UnitHeader-version">
    <a href="?tab=versions">Version: </a><strong>go1.17.6</strong>
  </span>
  <span class="go-Main-headerDetailItem" data-test-id="UnitHeader-licenses">
    <a href="?tab=licenses">License: </a><span>BSD-3-Clause</span>
  </span>
</div>
</body></html>"#;

    #[rstest]
    #[case("bufio", None, "https://pkg.go.dev/bufio")]
    #[case("bufio", Some("go1.17.6"), "https://pkg.go.dev/bufio@go1.17.6")]
    #[case(
        "github.com/getsentry/sentry-go",
        Some("v0.12.0"),
        "https://pkg.go.dev/github.com/getsentry/sentry-go@v0.12.0"
    )]
    fn package_url_appends_version(
        #[case] name: &str,
        #[case] version: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(package_url(DEFAULT_BASE_URL, name, version), expected);
    }

    #[rstest]
    #[case("/net/http", Some("go1.16.13"), "https://pkg.go.dev/net/http@go1.16.13")]
    #[case("/net/http", None, "https://pkg.go.dev/net/http")]
    #[case("/net/http@go1.16.13", Some("go1.16.13"), "https://pkg.go.dev/net/http@go1.16.13")]
    #[case(
        "/net/http?tab=imports",
        Some("go1.16.13"),
        "https://pkg.go.dev/net/http@go1.16.13?tab=imports"
    )]
    fn redirect_target_reapplies_version(
        #[case] location: &str,
        #[case] version: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(redirect_target(DEFAULT_BASE_URL, location, version), expected);
    }

    #[test]
    fn header_details_reads_labeled_values() {
        let details = header_details(BUFIO_PAGE);
        assert_eq!(details.get("Version").map(String::as_str), Some("go1.17.6"));
        assert_eq!(details.get("License").map(String::as_str), Some("BSD-3-Clause"));
    }

    #[tokio::test]
    async fn fetch_scrapes_version_license_and_imports() {
        let mut server = Server::new_async().await;
        let page = server
            .mock("GET", "/bufio@go1.17.6")
            .with_status(200)
            .with_body(BUFIO_PAGE)
            .create_async()
            .await;
        let _imports = server
            .mock("GET", "/bufio@go1.17.6?tab=imports")
            .with_status(200)
            .with_body(
                r#"<ul>
                    <li class="Imports-listItem"><a href="/bytes">bytes</a></li>
                    <li class="Imports-listItem"><a href="/errors">errors</a></li>
                </ul>"#,
            )
            .create_async()
            .await;

        let registry = GoPkgsiteRegistry::new(&server.url());
        let record = registry.fetch("bufio", Some("go1.17.6")).await.unwrap();

        page.assert_async().await;
        assert_eq!(record.declared.pkg_name, "bufio");
        assert_eq!(record.declared.pkg_ver, "go1.17.6");
        assert_eq!(record.declared.pkg_lic, vec!["BSD-3-Clause".to_string()]);
        assert_eq!(
            record.declared.pkg_dep,
            vec!["bytes;latest".to_string(), "errors;latest".to_string()]
        );
    }

    #[tokio::test]
    async fn fetch_reads_imports_of_the_requested_version() {
        let mut server = Server::new_async().await;
        let _page = server
            .mock("GET", "/bufio@go1.17.6")
            .with_status(200)
            .with_body(BUFIO_PAGE)
            .create_async()
            .await;
        let pinned = server
            .mock("GET", "/bufio@go1.17.6?tab=imports")
            .with_status(200)
            .with_body(r#"<li class="Imports-listItem"><a href="/old/import">old/import</a></li>"#)
            .create_async()
            .await;
        let latest = server
            .mock("GET", "/bufio?tab=imports")
            .with_status(200)
            .with_body(r#"<li class="Imports-listItem"><a href="/latest/import">latest/import</a></li>"#)
            .expect(0)
            .create_async()
            .await;

        let registry = GoPkgsiteRegistry::new(&server.url());
        let record = registry.fetch("bufio", Some("go1.17.6")).await.unwrap();

        pinned.assert_async().await;
        latest.assert_async().await;
        assert_eq!(record.declared.pkg_dep, vec!["old/import;latest".to_string()]);
    }

    #[tokio::test]
    async fn fetch_follows_redirect_with_version() {
        let mut server = Server::new_async().await;
        let _redirect = server
            .mock("GET", "/http@go1.16.13")
            .with_status(302)
            .with_header("location", "/net/http")
            .create_async()
            .await;
        let target = server
            .mock("GET", "/net/http@go1.16.13")
            .with_status(200)
            .with_body(BUFIO_PAGE.replace("go1.17.6", "go1.16.13"))
            .create_async()
            .await;
        let _imports_redirect = server
            .mock("GET", "/http@go1.16.13?tab=imports")
            .with_status(302)
            .with_header("location", "/net/http?tab=imports")
            .create_async()
            .await;
        let _imports = server
            .mock("GET", "/net/http@go1.16.13?tab=imports")
            .with_status(200)
            .with_body(r#"<li class="Imports-listItem"><a href="/net/url">net/url</a></li>"#)
            .create_async()
            .await;

        let registry = GoPkgsiteRegistry::new(&server.url());
        let record = registry.fetch("http", Some("go1.16.13")).await.unwrap();

        target.assert_async().await;
        assert_eq!(record.declared.pkg_name, "http");
        assert_eq!(record.declared.pkg_ver, "go1.16.13");
        assert_eq!(record.declared.pkg_lic, vec!["BSD-3-Clause".to_string()]);
        assert_eq!(record.declared.pkg_dep, vec!["net/url;latest".to_string()]);
    }

    #[tokio::test]
    async fn fetch_treats_non_200_as_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/example.com/missing")
            .with_status(400)
            .create_async()
            .await;

        let registry = GoPkgsiteRegistry::new(&server.url());
        let result = registry.fetch("example.com/missing", None).await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_versions_reads_version_tags() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/github.com/getsentry/sentry-go?tab=versions")
            .with_status(200)
            .with_body(
                r#"<div class="Version-tag"><a href="/github.com/getsentry/sentry-go@v0.12.0">v0.12.0</a></div>
                <div class="Version-tag"><a href="/github.com/getsentry/sentry-go@v0.11.0">v0.11.0</a></div>
                <div class="Version-tag"><a href="/github.com/getsentry/sentry-go@v0.9.0">v0.9.0</a></div>"#,
            )
            .create_async()
            .await;

        let registry = GoPkgsiteRegistry::new(&server.url());
        let result = registry
            .list_versions("github.com/getsentry/sentry-go")
            .await
            .unwrap();

        assert_eq!(
            result.versions,
            vec![
                "v0.9.0".to_string(),
                "v0.11.0".to_string(),
                "v0.12.0".to_string()
            ]
        );
    }
}
