//! Package identifiers accepted by the inspector
//!
//! - `name` resolves the latest version
//! - `name;version` pins an exact version
//! - `name|constraint` resolves the highest version admitted by the constraint

use crate::parser::types::split_dep_entry;

/// One package to inspect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub name: String,
    /// Exact version, used as-is without consulting the candidate list
    pub version: Option<String>,
    /// Raw constraint in the ecosystem's own grammar
    pub constraint: Option<String>,
}

impl PackageRequest {
    pub fn latest(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            version: None,
            constraint: None,
        }
    }

    /// Parse a command-line identifier
    pub fn parse(identifier: &str) -> Self {
        let identifier = identifier.trim();

        if let Some((name, constraint)) = identifier.split_once('|') {
            return Self {
                name: name.trim().to_string(),
                version: None,
                constraint: non_empty(constraint),
            };
        }

        if let Some((name, version)) = identifier.split_once(';') {
            let version = non_empty(version).filter(|v| v != "latest");
            return Self {
                name: name.trim().to_string(),
                version,
                constraint: None,
            };
        }

        Self::latest(identifier)
    }

    /// Build a request from a discovered `name;constraint` dependency entry
    pub fn from_dep_entry(entry: &str) -> Self {
        let (name, constraint) = split_dep_entry(entry);
        Self {
            name: name.to_string(),
            version: None,
            constraint: constraint.map(str::to_string),
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
