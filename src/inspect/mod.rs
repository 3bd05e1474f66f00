//! Package inspection: request parsing, per-ecosystem wiring, the
//! dependency-closure walk and the output report

pub mod report;
pub mod request;
pub mod resolver;
pub mod walker;

pub use report::build_report;
pub use request::PackageRequest;
pub use resolver::{PackageResolver, create_default_resolvers};
pub use walker::Inspector;
