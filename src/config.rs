use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::parser::types::Ecosystem;
use crate::vcs::license::{default_license_files, default_license_table, default_manifest_files};
use crate::version::cache::DEFAULT_TTL_SECS;

// =============================================================================
// Walker constants
// =============================================================================

/// Maximum number of sibling items resolved at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Delay between starting each sibling request to avoid rate limiting (10ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 10;

/// Default GitHub REST API base URL
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Environment variable consulted when no GitHub token is configured
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Inspector configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InspectorConfig {
    pub cache: CacheConfig,
    pub walker: WalkerConfig,
    pub registries: RegistriesConfig,
    pub github: GithubConfig,
    /// Root-level license file names, in priority order
    pub license_files: Vec<String>,
    /// License text marker -> license name
    pub license_table: IndexMap<String, String>,
    /// Ecosystem -> manifest file names tried at a repository root
    pub manifest_files: IndexMap<String, Vec<String>>,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            walker: WalkerConfig::default(),
            registries: RegistriesConfig::default(),
            github: GithubConfig::default(),
            license_files: default_license_files(),
            license_table: default_license_table(),
            manifest_files: default_manifest_files(),
        }
    }
}

impl InspectorConfig {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Manifest file names for an ecosystem
    pub fn manifest_files_for(&self, ecosystem: Ecosystem) -> &[String] {
        self.manifest_files
            .get(ecosystem.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Seconds a stored result stays fresh
    pub ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

/// Dependency walker configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WalkerConfig {
    pub max_concurrency: usize,
    pub stagger_delay_ms: u64,
    /// Per-request deadline; no deadline when unset
    pub timeout_secs: Option<u64>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            stagger_delay_ms: FETCH_STAGGER_DELAY_MS,
            timeout_secs: None,
        }
    }
}

/// Registry-specific configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RegistriesConfig {
    pub python: RegistryConfig,
    pub javascript: RegistryConfig,
    pub go: RegistryConfig,
    pub rust: RegistryConfig,
    pub cs: RegistryConfig,
    pub php: RegistryConfig,
    pub ruby: RegistryConfig,
}

impl RegistriesConfig {
    pub fn get(&self, ecosystem: Ecosystem) -> &RegistryConfig {
        match ecosystem {
            Ecosystem::Python => &self.python,
            Ecosystem::JavaScript => &self.javascript,
            Ecosystem::Go => &self.go,
            Ecosystem::Rust => &self.rust,
            Ecosystem::CSharp => &self.cs,
            Ecosystem::Php => &self.php,
            Ecosystem::Ruby => &self.ruby,
        }
    }
}

/// Individual registry configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub enabled: bool,
    /// Overrides the public registry URL (mirrors, test servers)
    pub base_url: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
        }
    }
}

/// GitHub fallback configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GithubConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GITHUB_API.to_string(),
            token: None,
        }
    }
}

impl GithubConfig {
    /// Configured token, else `$GITHUB_TOKEN`
    pub fn resolved_token(&self) -> Option<String> {
        resolve_token(self.token.clone(), std::env::var(GITHUB_TOKEN_ENV).ok())
    }
}

fn resolve_token(configured: Option<String>, env: Option<String>) -> Option<String> {
    configured
        .or(env)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Returns the path to the data directory for dep-inspector.
/// Uses $XDG_DATA_HOME/dep-inspector if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/dep-inspector,
/// or ./dep-inspector if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("cache.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("dep-inspector.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("dep-inspector")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn inspector_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<InspectorConfig>(json!({
            "cache": {
                "ttlSecs": 60
            }
        }))
        .unwrap();

        assert_eq!(result.cache.ttl_secs, 60);
        assert_eq!(result.walker, WalkerConfig::default());
        assert_eq!(result.registries, RegistriesConfig::default());
        assert_eq!(result.license_files, default_license_files());
        assert_eq!(result.license_table, default_license_table());
    }

    #[test]
    fn inspector_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<InspectorConfig>(json!({
            "cache": { "ttlSecs": 10 },
            "walker": { "maxConcurrency": 2, "staggerDelayMs": 0, "timeoutSecs": 30 },
            "registries": {
                "python": { "enabled": true, "baseUrl": "http://localhost:8080" },
                "go": { "enabled": false }
            },
            "github": { "baseUrl": "http://localhost:9090", "token": "abc" },
            "licenseFiles": ["LICENSE"],
            "licenseTable": { "MIT License": "MIT" },
            "manifestFiles": { "python": ["requirements.txt"] }
        }))
        .unwrap();

        assert_eq!(
            result.walker,
            WalkerConfig {
                max_concurrency: 2,
                stagger_delay_ms: 0,
                timeout_secs: Some(30),
            }
        );
        assert_eq!(
            result.registries.get(Ecosystem::Python).base_url.as_deref(),
            Some("http://localhost:8080")
        );
        assert!(!result.registries.get(Ecosystem::Go).enabled);
        assert!(result.registries.get(Ecosystem::Rust).enabled);
        assert_eq!(result.github.token.as_deref(), Some("abc"));
        assert_eq!(result.license_files, vec!["LICENSE".to_string()]);
        assert_eq!(
            result.manifest_files_for(Ecosystem::Python),
            &["requirements.txt".to_string()]
        );
        assert!(result.manifest_files_for(Ecosystem::Go).is_empty());
    }

    #[test]
    fn from_file_reads_json_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"walker": {{"maxConcurrency": 1}}}}"#).unwrap();

        let config = InspectorConfig::from_file(file.path()).unwrap();

        assert_eq!(config.walker.max_concurrency, 1);
        assert_eq!(config.cache.ttl_secs, DEFAULT_TTL_SECS);
    }

    #[test]
    fn from_file_reports_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = InspectorConfig::from_file(file.path());

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn resolve_token_prefers_configured_value() {
        assert_eq!(
            resolve_token(Some("config".to_string()), Some("env".to_string())).as_deref(),
            Some("config")
        );
        assert_eq!(
            resolve_token(None, Some("env".to_string())).as_deref(),
            Some("env")
        );
        assert_eq!(resolve_token(Some("  ".to_string()), None), None);
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/dep-inspector"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/dep-inspector"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./dep-inspector"));
    }
}
