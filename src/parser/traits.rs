//! Parser trait definition

use crate::parser::types::DeclaredDeps;

/// Trait for parsing manifest files
pub trait ManifestParser: Send + Sync {
    /// Check if this parser can handle the given file name
    fn can_parse(&self, filename: &str) -> bool;

    /// Parse the content and extract the declared package metadata
    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError>;
}

/// Error type for parsing operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to parse the file structure
    #[error("Failed to parse file: {0}")]
    ParseFailed(String),

    /// Invalid syntax in the file
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),

    /// Tree-sitter related error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// No parser exists for this manifest format
    #[error("Manifest format unsupported: {0}")]
    Unsupported(String),
}
