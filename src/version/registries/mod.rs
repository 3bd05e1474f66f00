//! Registry implementations for fetching package versions and metadata

pub mod crates_io;
pub mod go_pkgsite;
pub mod npm;
pub mod nuget;
pub mod packagist;
pub mod pypi;
pub mod rubygems;

pub use crates_io::CratesIoRegistry;
pub use go_pkgsite::GoPkgsiteRegistry;
pub use npm::NpmRegistry;
pub use nuget::NugetRegistry;
pub use packagist::PackagistRegistry;
pub use pypi::PypiRegistry;
pub use rubygems::RubygemsRegistry;

use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::version::error::RegistryError;
use crate::version::semver::Version;

pub(crate) const USER_AGENT: &str = concat!("dep-inspector/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder carrying the user agent and timeout every adapter sends
pub(crate) fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
}

/// HTTP client shared by the registry adapters
pub(crate) fn http_client() -> reqwest::Client {
    client_builder()
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build configured HTTP client, using defaults: {}", e);
            reqwest::Client::new()
        })
}

/// Send a GET request and map the status codes every registry treats alike
///
/// 404 becomes [`RegistryError::NotFound`], 429 becomes
/// [`RegistryError::RateLimited`], other failures become
/// [`RegistryError::InvalidResponse`].
pub(crate) async fn get_checked(
    client: &reqwest::Client,
    url: &str,
    package_name: &str,
) -> Result<reqwest::Response, RegistryError> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RegistryError::NotFound(package_name.to_string()));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(RegistryError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        warn!("Registry returned status {}: {}", status, url);
        return Err(RegistryError::InvalidResponse(format!(
            "Unexpected status: {}",
            status
        )));
    }

    Ok(response)
}

/// GET a URL and decode the body as JSON
pub(crate) async fn get_json(
    client: &reqwest::Client,
    url: &str,
    package_name: &str,
) -> Result<Value, RegistryError> {
    let response = get_checked(client, url, package_name).await?;
    response.json().await.map_err(|e| {
        warn!("Failed to parse registry response from {}: {}", url, e);
        RegistryError::InvalidResponse(e.to_string())
    })
}

/// Non-empty string at a JSON pointer
pub(crate) fn json_string(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Every string element of the array at a JSON pointer
pub(crate) fn json_strings(value: &Value, pointer: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Sort versions oldest first
pub(crate) fn sort_versions(versions: Vec<String>) -> Vec<String> {
    let mut versions: Vec<(String, Version)> = versions
        .into_iter()
        .map(|v| {
            let parsed = Version::parse(&v);
            (v, parsed)
        })
        .collect();
    versions.sort_by(|(_, a), (_, b)| a.cmp(b));
    versions.into_iter().map(|(v, _)| v).collect()
}
