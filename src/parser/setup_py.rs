//! setup.py parser
//!
//! setup.py is executable Python, so only literal keyword arguments of the
//! `setup(...)` call are read: `name`, `version`, `license`,
//! `python_requires`, `classifiers` and `install_requires`. Values computed
//! at runtime are left empty.

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::requirements_txt::requirement_entry;
use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, license_classifiers};

/// `keyword="literal"` with either quote style
static STRING_KWARG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(name|version|license|python_requires)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("string keyword regex is valid")
});
/// `keyword=[ ... ]` list literal, possibly spanning lines
static LIST_KWARG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(install_requires|classifiers)\s*=\s*\[([^\]]*)\]")
        .expect("list keyword regex is valid")
});
static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"|'([^']*)'"#).expect("list item regex is valid")
});

fn list_items(body: &str) -> Vec<String> {
    LIST_ITEM_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Drop `#` comments so commented-out requirements are not picked up
fn strip_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| match line.find('#') {
            Some(pos) if !line[..pos].contains(['"', '\'']) => &line[..pos],
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parser for setup.py files
pub struct SetupPyParser;

impl ManifestParser for SetupPyParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "setup.py"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let content = strip_comments(content);
        let Some(start) = content.find("setup(") else {
            return Err(ParseError::ParseFailed("no setup() call".to_string()));
        };
        let call = &content[start..];

        let mut declared = DeclaredDeps::default();
        let mut classifiers = Vec::new();

        for caps in STRING_KWARG_RE.captures_iter(call) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            match &caps[1] {
                "name" if declared.pkg_name.is_empty() => declared.pkg_name = value,
                "version" if declared.pkg_ver.is_empty() => declared.pkg_ver = value,
                "license" if declared.pkg_lic.is_empty() && !value.is_empty() => {
                    declared.pkg_lic = vec![value]
                }
                "python_requires" if declared.lang_ver.is_empty() && !value.is_empty() => {
                    declared.lang_ver = vec![value]
                }
                _ => {}
            }
        }

        for caps in LIST_KWARG_RE.captures_iter(call) {
            let items = list_items(&caps[2]);
            match &caps[1] {
                "install_requires" => declared
                    .pkg_dep
                    .extend(items.iter().filter_map(|item| requirement_entry(item))),
                _ => classifiers.extend(items),
            }
        }

        if declared.pkg_lic.is_empty() {
            declared.pkg_lic = license_classifiers(classifiers.iter().map(String::as_str));
        }

        Ok(declared)
    }
}
