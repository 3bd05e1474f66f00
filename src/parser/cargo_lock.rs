//! Cargo.lock parser
//!
//! Every `[[package]]` entry becomes a pinned `name;version` dependency.
//! Packages without a `source` are workspace members, not dependencies;
//! when exactly one exists it names the locked crate itself.

use tree_sitter::Node;

use crate::parser::toml;
use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// Parser for Cargo.lock files
pub struct CargoLockParser;

struct LockedPackage {
    name: String,
    version: String,
    local: bool,
}

fn locked_package(element: Node, content: &str) -> Option<LockedPackage> {
    let text = |key: &str| {
        toml::lookup(element, content, key).and_then(|v| toml::string_value(v, content))
    };
    Some(LockedPackage {
        name: text("name")?,
        version: text("version").unwrap_or_default(),
        local: text("source").is_none(),
    })
}

impl ManifestParser for CargoLockParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "Cargo.lock"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let tree = toml::parse_tree(content)?;
        let root = tree.root_node();

        let mut cursor = root.walk();
        let packages: Vec<LockedPackage> = root
            .children(&mut cursor)
            .filter(|node| toml::array_table_name(*node, content).as_deref() == Some("package"))
            .filter_map(|node| locked_package(node, content))
            .collect();

        let (local, remote): (Vec<_>, Vec<_>) = packages.into_iter().partition(|p| p.local);

        let mut declared = DeclaredDeps {
            pkg_dep: remote
                .iter()
                .map(|p| dep_entry(&p.name, &p.version))
                .collect(),
            ..Default::default()
        };
        if let [member] = local.as_slice() {
            declared.pkg_name = member.name.clone();
            declared.pkg_ver = member.version.clone();
        }
        Ok(declared)
    }
}
