//! go.mod parser
//!
//! Parses go.mod files to extract the module path, the `go` directive and
//! the module dependencies. Supports both single-line require directives
//! and require blocks.
//!
//! Format examples:
//! - Single: `require golang.org/x/text v0.14.0`
//! - Block:
//!   ```text
//!   require (
//!       golang.org/x/text v0.14.0
//!       golang.org/x/net v0.20.0 // indirect
//!   )
//!   ```

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// `module example.com/m`
static MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^module\s+(\S+)").expect("module regex is valid"));
/// `go 1.21`
static GO_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^go\s+(\S+)").expect("go directive regex is valid"));
/// `require module/path v1.2.3 [// comment]`
static SINGLE_REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^require\s+(\S+)\s+(v[^\s]+)(?:\s*//.*)?$").expect("require regex is valid")
});
/// `require (`
static BLOCK_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^require\s*\(\s*$").expect("block regex is valid"));
/// `module/path v1.2.3 [// comment]` inside a block
static REQUIRE_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+)\s+(v[^\s]+)(?:\s*//.*)?$").expect("require spec regex is valid")
});

/// Parser for go.mod files
pub struct GoModParser;

impl GoModParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoModParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for GoModParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "go.mod"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let mut declared = DeclaredDeps::default();
        let mut in_require_block = false;

        for line in content.lines() {
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }

            if in_require_block {
                if trimmed == ")" {
                    in_require_block = false;
                } else if let Some(caps) = REQUIRE_SPEC_RE.captures(trimmed) {
                    declared.pkg_dep.push(dep_entry(&caps[1], &caps[2]));
                }
                continue;
            }

            if BLOCK_START_RE.is_match(trimmed) {
                in_require_block = true;
            } else if let Some(caps) = SINGLE_REQUIRE_RE.captures(trimmed) {
                declared.pkg_dep.push(dep_entry(&caps[1], &caps[2]));
            } else if let Some(caps) = MODULE_RE.captures(trimmed) {
                declared.pkg_name = caps[1].to_string();
            } else if let Some(caps) = GO_DIRECTIVE_RE.captures(trimmed) {
                declared.lang_ver.push(caps[1].to_string());
            }
        }

        if in_require_block {
            return Err(ParseError::InvalidSyntax(
                "unterminated require block".to_string(),
            ));
        }

        Ok(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_line_require() {
        let content = r#"module example.com/myproject

go 1.21

require golang.org/x/text v0.14.0
"#;
        let declared = GoModParser::new().parse(content).unwrap();

        assert_eq!(declared.pkg_name, "example.com/myproject");
        assert_eq!(declared.lang_ver, vec!["1.21".to_string()]);
        assert_eq!(
            declared.pkg_dep,
            vec!["golang.org/x/text;v0.14.0".to_string()]
        );
    }

    #[test]
    fn parse_require_block() {
        let content = r#"module example.com/myproject

go 1.21

require (
	golang.org/x/text v0.14.0
	golang.org/x/net v0.20.0 // indirect
	github.com/google/uuid v0.0.0-20210101000000-abcdef123456
)

replace golang.org/x/net => ../net
"#;
        let declared = GoModParser::new().parse(content).unwrap();

        assert_eq!(
            declared.pkg_dep,
            vec![
                "golang.org/x/text;v0.14.0".to_string(),
                "golang.org/x/net;v0.20.0".to_string(),
                "github.com/google/uuid;v0.0.0-20210101000000-abcdef123456".to_string(),
            ]
        );
    }

    #[test]
    fn parse_rejects_unterminated_block() {
        let content = "module m\n\nrequire (\n\tgolang.org/x/text v0.14.0\n";
        assert!(GoModParser::new().parse(content).is_err());
    }

    #[test]
    fn parse_empty_content() {
        let declared = GoModParser::new().parse("").unwrap();
        assert!(declared.pkg_dep.is_empty());
    }
}
