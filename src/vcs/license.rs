//! License file detection and classification

use indexmap::IndexMap;

use crate::parser::types::Ecosystem;
use crate::version::types::UNKNOWN_LICENSE;

/// Root-level file names that may hold a license text, in priority order
pub const DEFAULT_LICENSE_FILES: &[&str] = &[
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "COPYRIGHT",
    "COPYING",
    "COPYING.md",
    "LICENSE.textile",
    "COPYING.textile",
    "LICENSE-MIT",
    "COPYING-MIT",
    "MIT-LICENSE-MIT",
    "MIT-COPYING",
    "OFL.md",
    "OFL.textile",
    "OFL",
    "OFL.txt",
    "PATENTS",
    "PATENTS.txt",
    "WTFPL",
    "UNLICENSE",
];

/// Distinctive substring of a license text -> license name
pub const DEFAULT_LICENSE_TABLE: &[(&str, &str)] = &[
    ("AFL", "Academic Free License"),
    ("Apache", "Apache Software License"),
    ("Apple", "Apple Public Source License"),
    ("Artistic", "Artistic License"),
    ("AAL", "Attribution Assurance License"),
    ("Bittorrent", "Bittorrent Open Source License"),
    ("Boost Software License", "Boost Software License"),
    ("BSD 2-Clause", "BSD 2-Clause License"),
    ("BSD 3-Clause", "BSD 3-Clause License"),
    ("BSD 4-Clause", "BSD 4-Clause License"),
    ("BSD Zero Clause License", "BSD Zero Clause license"),
    ("CeCILL", "CeCILL Free Software License"),
    ("CDDL", "Common Development and Distribution License"),
    (
        "Creative Commons Attribution 4.0",
        "Creative Commons Attribution 4.0 International Public License",
    ),
    (
        "Creative Commons Attribution-ShareAlike 4.0",
        "Creative Commons Attribution-ShareAlike 4.0 International Public License",
    ),
    ("CC0", "Creative Commons Legal Code"),
    ("Clear BSD", "Clear BSD License"),
    ("DO WHAT THE", "Do What The F*ck You Want To Public License"),
    ("Eclipse Public License", "Eclipse Public License"),
    ("Educational Community License", "Educational Community License"),
    ("Eiffel", "Eiffel Forum License"),
    ("EUPL", "European Union Public License"),
    ("AGPL", "GNU Affero General Public License"),
    ("GNU General Public License", "GNU General Public License"),
    ("Lesser General Public License", "GNU Lesser General Public License"),
    ("HPND", "Historical Permission Notice and Disclaimer"),
    ("IBM Public License", "IBM Public License"),
    ("Intel Open Source License", "Intel Open Source License"),
    ("ISC License", "ISC License"),
    ("LaTeX Project Public License", "LaTeX Project Public License"),
    ("Ms-PL", "Microsoft Public License"),
    ("Ms-RL", "Microsoft Reciprocal License"),
    ("MirOS", "MirOS License"),
    ("MIT License", "MIT License"),
    ("MIT No Attribution", "MIT No Attribution"),
    ("Mozilla Public License", "Mozilla Public License"),
    ("MulanPSL2", "Mulan Permissive Software License"),
    ("Netizen", "Netizen Open Source License"),
    ("Netscape Public License", "Netscape Public License"),
    ("Nokia Open Source License", "Nokia Open Source License"),
    ("ODbL", "Open Database License"),
    (
        "Open Data Commons Attribution License",
        "Open Data Commons Attribution License",
    ),
    ("Open Software License", "Open Software License"),
    ("PostgreSQL License", "PostgreSQL License"),
    (
        "Python Software Foundation License",
        "Python Software Foundation License",
    ),
    ("Python License", "Python License"),
    ("Public Domain", "Public Domain"),
    ("Q Public License", "Q Public License"),
    ("RealNetworks Public License", "RealNetworks Public License"),
    ("Repoze", "Repoze Public License"),
    ("SIL Open Font License", "SIL Open Font License"),
    ("Sleepycat", "Sleepycat License"),
    ("Sun Public License", "Sun Public License"),
    ("Watcom", "Sybase Open Watcom Public License"),
    ("Universal Permissive License", "Universal Permissive License"),
    ("NCSA", "University of Illinois/NCSA Open Source License"),
    ("unlicense", "Unlicense"),
    ("VIM LICENSE", "VIM License"),
    ("Vovida", "Vovida Software License"),
    ("W3C License", "W3C License"),
    ("X.Net License", "X.Net License"),
    ("zlib License", "zlib License"),
    ("Zope", "Zope Public License"),
];

pub fn default_license_files() -> Vec<String> {
    DEFAULT_LICENSE_FILES.iter().map(|f| f.to_string()).collect()
}

pub fn default_license_table() -> IndexMap<String, String> {
    DEFAULT_LICENSE_TABLE
        .iter()
        .map(|(needle, name)| (needle.to_string(), name.to_string()))
        .collect()
}

/// Manifest file names looked up at a repository root, in priority order
///
/// Entries starting with `*` match by suffix.
pub fn default_manifest_files() -> IndexMap<String, Vec<String>> {
    Ecosystem::ALL
        .iter()
        .map(|ecosystem| {
            let files: &[&str] = match ecosystem {
                Ecosystem::Python => &[
                    "pyproject.toml",
                    "setup.py",
                    "setup.cfg",
                    "requirements.txt",
                    "Pipfile.lock",
                    "Pipfile",
                ],
                Ecosystem::JavaScript => &["package.json", "package-lock.json", "yarn.lock"],
                Ecosystem::Go => &["go.mod"],
                Ecosystem::Rust => &["Cargo.toml", "Cargo.lock"],
                Ecosystem::CSharp => &["*.nuspec"],
                Ecosystem::Php => &["composer.json"],
                Ecosystem::Ruby => &["*.gemspec", "Gemfile"],
            };
            (
                ecosystem.as_str().to_string(),
                files.iter().map(|f| f.to_string()).collect(),
            )
        })
        .collect()
}

/// Whether a file name matches a configured pattern (`*.ext` or exact)
pub fn matches_file_pattern(pattern: &str, filename: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => filename.ends_with(suffix) && filename.len() > suffix.len(),
        None => pattern == filename,
    }
}

/// First entry of `listing` that matches a pattern, honouring pattern order
pub fn first_match<'a>(patterns: &[String], listing: &'a [String]) -> Option<&'a String> {
    patterns.iter().find_map(|pattern| {
        listing
            .iter()
            .find(|name| matches_file_pattern(pattern, name))
    })
}

/// Every license whose marker occurs in `text`, or `["Other"]` when none does
pub fn classify(text: &str, table: &IndexMap<String, String>) -> Vec<String> {
    let mut licenses: Vec<String> = Vec::new();
    for (needle, name) in table {
        if text.contains(needle.as_str()) && !licenses.contains(name) {
            licenses.push(name.clone());
        }
    }
    if licenses.is_empty() {
        licenses.push(UNKNOWN_LICENSE.to_string());
    }
    licenses
}

/// True when classification found nothing recognisable
pub fn is_unclassified(licenses: &[String]) -> bool {
    licenses.iter().all(|l| l == UNKNOWN_LICENSE)
}
