//! Ecosystem-specific version matchers

pub mod crates;
pub mod go;
pub mod npm;
pub mod nuget;
pub mod packagist;
pub mod pypi;
pub mod range;
pub mod rubygems;

pub use crates::CratesVersionMatcher;
pub use go::GoVersionMatcher;
pub use npm::NpmVersionMatcher;
pub use nuget::NugetVersionMatcher;
pub use packagist::PackagistVersionMatcher;
pub use pypi::PypiVersionMatcher;
pub use rubygems::RubygemsVersionMatcher;
