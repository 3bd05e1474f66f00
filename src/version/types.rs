//! Common types shared by registries, the cache and the walker

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parser::types::DeclaredDeps;

/// License label used when nothing could be detected
pub const UNKNOWN_LICENSE: &str = "Other";

/// Versions of a package as reported by its registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageVersions {
    /// All published versions, oldest first
    pub versions: Vec<String>,
    /// Registry-maintained tags such as npm's `latest`
    pub dist_tags: HashMap<String, String>,
}

impl PackageVersions {
    pub fn new(versions: Vec<String>) -> Self {
        Self {
            versions,
            dist_tags: HashMap::new(),
        }
    }

    pub fn with_dist_tags(versions: Vec<String>, dist_tags: HashMap<String, String>) -> Self {
        Self {
            versions,
            dist_tags,
        }
    }
}

/// Resolved metadata for one package version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageResult {
    pub import_name: String,
    pub lang_ver: Vec<String>,
    pub pkg_name: String,
    pub pkg_ver: String,
    pub pkg_lic: Vec<String>,
    /// Annotations such as `unresolved`, `registry` or `vcs`
    pub pkg_err: IndexMap<String, String>,
    /// Entries in `name;constraint` form
    pub pkg_dep: Vec<String>,
    /// ISO-8601 (RFC 3339) UTC time when the result was produced
    pub timestamp: String,
}

impl PackageResult {
    pub fn new(import_name: &str) -> Self {
        Self {
            import_name: import_name.to_string(),
            pkg_name: import_name.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        }
    }

    /// Record an annotation, keeping the first message for a key
    pub fn annotate(&mut self, key: &str, message: impl Into<String>) {
        self.pkg_err
            .entry(key.to_string())
            .or_insert_with(|| message.into());
    }

    /// Fill every field that is still empty from a parsed manifest
    pub fn merge_declared(&mut self, declared: DeclaredDeps) {
        if self.pkg_name.is_empty() && !declared.pkg_name.is_empty() {
            self.pkg_name = declared.pkg_name;
        }
        if self.pkg_ver.is_empty() && !declared.pkg_ver.is_empty() {
            self.pkg_ver = declared.pkg_ver;
        }
        if self.license_unknown() && !declared.pkg_lic.is_empty() {
            self.pkg_lic = declared.pkg_lic;
        }
        if self.pkg_dep.is_empty() {
            self.pkg_dep = declared.pkg_dep;
        }
        if self.lang_ver.is_empty() {
            self.lang_ver = declared.lang_ver;
        }
        if let Some(note) = declared.deprecated {
            self.annotate("deprecated", note);
        }
    }

    /// True when no license has been detected yet
    pub fn license_unknown(&self) -> bool {
        self.pkg_lic.is_empty() || self.pkg_lic.iter().all(|l| l == UNKNOWN_LICENSE)
    }

    /// Replace an empty license list with the `Other` placeholder
    pub fn finalize(&mut self) {
        if self.pkg_lic.is_empty() {
            self.pkg_lic = vec![UNKNOWN_LICENSE.to_string()];
        }
    }
}

/// Partial result produced by a registry adapter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRecord {
    pub declared: DeclaredDeps,
    /// Source repository advertised by the registry, used for the VCS fallback
    pub repository: Option<String>,
}
