//! Common types for parsers

/// Package-management universe a package belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    /// PyPI (requirements.txt, pyproject.toml)
    Python,
    /// npm registry (package.json)
    JavaScript,
    /// pkg.go.dev (go.mod)
    Go,
    /// crates.io (Cargo.toml)
    Rust,
    /// NuGet (*.nuspec)
    CSharp,
    /// Packagist (composer.json)
    Php,
    /// RubyGems
    Ruby,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 7] = [
        Ecosystem::Python,
        Ecosystem::JavaScript,
        Ecosystem::Go,
        Ecosystem::Rust,
        Ecosystem::CSharp,
        Ecosystem::Php,
        Ecosystem::Ruby,
    ];

    /// Returns the string representation of the ecosystem
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Python => "python",
            Ecosystem::JavaScript => "javascript",
            Ecosystem::Go => "go",
            Ecosystem::Rust => "rust",
            Ecosystem::CSharp => "cs",
            Ecosystem::Php => "php",
            Ecosystem::Ruby => "ruby",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ecosystem {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" | "pypi" => Ok(Ecosystem::Python),
            "javascript" | "js" | "npm" => Ok(Ecosystem::JavaScript),
            "go" | "golang" => Ok(Ecosystem::Go),
            "rust" | "crates" | "crates_io" => Ok(Ecosystem::Rust),
            "cs" | "csharp" | "c#" | "nuget" => Ok(Ecosystem::CSharp),
            "php" | "composer" | "packagist" => Ok(Ecosystem::Php),
            "ruby" | "rubygems" | "gem" => Ok(Ecosystem::Ruby),
            _ => Err(()),
        }
    }
}

/// Metadata declared by a manifest file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredDeps {
    pub pkg_name: String,
    pub pkg_ver: String,
    pub pkg_lic: Vec<String>,
    /// Entries in `name;constraint` form
    pub pkg_dep: Vec<String>,
    pub lang_ver: Vec<String>,
    pub deprecated: Option<String>,
}

/// Flatten a dependency into its `name;constraint` entry
///
/// An absent constraint is written as `latest`.
pub fn dep_entry(name: &str, constraint: &str) -> String {
    let constraint = constraint.trim();
    if constraint.is_empty() {
        format!("{};latest", name.trim())
    } else {
        format!("{};{}", name.trim(), constraint)
    }
}

/// Split a `name;constraint` entry, mapping `latest` to no constraint
pub fn split_dep_entry(entry: &str) -> (&str, Option<&str>) {
    match entry.split_once(';') {
        Some((name, constraint)) => {
            let constraint = constraint.trim();
            if constraint.is_empty() || constraint == "latest" {
                (name.trim(), None)
            } else {
                (name.trim(), Some(constraint))
            }
        }
        None => (entry.trim(), None),
    }
}

/// Split an SPDX-style expression such as `MIT OR Apache-2.0` or `MIT/Apache-2.0`
pub fn split_license_expression(expression: &str) -> Vec<String> {
    expression
        .split(" OR ")
        .flat_map(|part| part.split('/'))
        .map(|part| part.trim().trim_start_matches('(').trim_end_matches(')').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trove classifier prefix carrying a license name
const LICENSE_CLASSIFIER: &str = "License :: ";

/// Last segment of each `License :: ...` trove classifier
pub fn license_classifiers<'a>(classifiers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    classifiers
        .into_iter()
        .map(str::trim)
        .filter(|c| c.starts_with(LICENSE_CLASSIFIER))
        .filter_map(|c| c.rsplit(" :: ").next())
        .filter(|name| *name != "OSI Approved")
        .map(str::to_string)
        .collect()
}
