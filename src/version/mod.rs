//! Version layer: parsing, constraints, registries and the result cache
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│    Cache    │◀────│  Resolver   │
//! │  (fetch)    │     │  (storage)  │     │ (max match) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │ Registries  │                         │   Matcher   │
//! │(pypi,npm..) │                         │(constraint) │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`semver`]: Lax version model shared by every ecosystem
//! - [`constraint`]: Specifier sets and OR-of-AND constraints
//! - [`matcher`]: Constraint interpreter trait
//! - [`matchers`]: Per-ecosystem constraint grammars
//! - [`resolver`]: Pick the highest admissible candidate
//! - [`registry`]: Registry trait for versions and metadata
//! - [`registries`]: Concrete registry clients (PyPI, npm, crates.io, ...)
//! - [`cache`]: SQLite result cache with a TTL
//! - [`error`]: Error types for cache and registry operations
//! - [`types`]: `PackageResult` and the registry payloads

pub mod cache;
pub mod constraint;
pub mod error;
pub mod matcher;
pub mod matchers;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod semver;
pub mod types;
