pub mod config;
pub mod inspect;
pub mod parser;
pub mod vcs;
pub mod version;
