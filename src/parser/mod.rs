//! Parser layer
//! - traits.rs: ManifestParser trait definition
//! - types.rs: Common types (Ecosystem, DeclaredDeps, dependency entries)
//! - toml.rs: tree-sitter helpers for the TOML manifests
//! - cargo_toml.rs, cargo_lock.rs, pyproject_toml.rs: TOML manifests
//! - package_json.rs, package_lock.rs, composer_json.rs: JSON manifests
//! - pipfile.rs: Pipfile (TOML) and Pipfile.lock (JSON)
//! - go_mod.rs, requirements_txt.rs, setup_cfg.rs, yarn_lock.rs: line-based manifests
//! - setup_py.rs: literal `setup()` keywords
//! - nuspec.rs: NuGet package specifications
//! - gemspec.rs: Ruby gemspec and Gemfile

pub mod cargo_lock;
pub mod cargo_toml;
pub mod composer_json;
pub mod gemspec;
pub mod go_mod;
pub mod nuspec;
pub mod package_json;
pub mod package_lock;
pub mod pipfile;
pub mod pyproject_toml;
pub mod requirements_txt;
pub mod setup_cfg;
pub mod setup_py;
pub mod toml;
pub mod traits;
pub mod types;
pub mod yarn_lock;

pub use cargo_lock::CargoLockParser;
pub use cargo_toml::CargoTomlParser;
pub use composer_json::ComposerJsonParser;
pub use gemspec::{GemfileParser, GemspecParser};
pub use go_mod::GoModParser;
pub use nuspec::NuspecParser;
pub use package_json::PackageJsonParser;
pub use package_lock::PackageLockParser;
pub use pipfile::{PipfileLockParser, PipfileParser};
pub use pyproject_toml::PyprojectTomlParser;
pub use requirements_txt::RequirementsTxtParser;
pub use setup_cfg::SetupCfgParser;
pub use setup_py::SetupPyParser;
pub use yarn_lock::YarnLockParser;
pub use traits::{ManifestParser, ParseError};
pub use types::{DeclaredDeps, Ecosystem};

/// Parse a manifest, choosing the parser from the file name
///
/// Directory components of `filename` are ignored.
pub fn parse_manifest(filename: &str, content: &str) -> Result<DeclaredDeps, ParseError> {
    let basename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let parsers: [&dyn ManifestParser; 16] = [
        &PackageJsonParser,
        &PackageLockParser,
        &YarnLockParser,
        &ComposerJsonParser,
        &CargoTomlParser,
        &CargoLockParser,
        &PyprojectTomlParser,
        &SetupPyParser,
        &SetupCfgParser,
        &PipfileParser,
        &PipfileLockParser,
        &GoModParser,
        &RequirementsTxtParser,
        &NuspecParser,
        &GemspecParser,
        &GemfileParser,
    ];

    parsers
        .into_iter()
        .find(|parser| parser.can_parse(basename))
        .ok_or_else(|| ParseError::Unsupported(basename.to_string()))?
        .parse(content)
}
