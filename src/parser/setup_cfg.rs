//! setup.cfg parser
//!
//! Reads `[metadata]` name, version, license and classifiers, and
//! `[options]` install_requires and python_requires. Multi-line values are
//! the indented continuation lines configparser understands.

use indexmap::IndexMap;

use crate::parser::requirements_txt::requirement_entry;
use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, license_classifiers};

type Sections = IndexMap<String, IndexMap<String, String>>;

/// Parser for setup.cfg files
pub struct SetupCfgParser;

impl ManifestParser for SetupCfgParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "setup.cfg"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let sections = read_sections(content)?;
        let value = |section: &str, key: &str| value_of(&sections, section, key);

        let pkg_lic = match value("metadata", "license").trim() {
            "" => license_classifiers(value("metadata", "classifiers").lines()),
            license => vec![license.to_string()],
        };

        Ok(DeclaredDeps {
            pkg_name: value("metadata", "name").trim().to_string(),
            pkg_ver: value("metadata", "version").trim().to_string(),
            pkg_lic,
            pkg_dep: value("options", "install_requires")
                .lines()
                .filter_map(requirement_entry)
                .collect(),
            lang_ver: Some(value("options", "python_requires").trim())
                .filter(|v| !v.is_empty())
                .map(|v| vec![v.to_string()])
                .unwrap_or_default(),
            deprecated: None,
        })
    }
}

fn value_of<'a>(sections: &'a Sections, section: &str, key: &str) -> &'a str {
    sections
        .get(section)
        .and_then(|entries| entries.get(key))
        .map(String::as_str)
        .unwrap_or_default()
}

/// Section -> key -> value, continuation lines joined with `\n`
fn read_sections(content: &str) -> Result<Sections, ParseError> {
    let mut sections = Sections::new();
    let mut section: Option<String> = None;
    let mut key: Option<String> = None;

    for (number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            if let (Some(section), Some(key)) = (&section, &key)
                && let Some(value) = sections.get_mut(section).and_then(|s| s.get_mut(key))
            {
                if !value.is_empty() {
                    value.push('\n');
                }
                value.push_str(trimmed);
            }
            continue;
        }

        if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            section = Some(name);
            key = None;
            continue;
        }

        let (Some(current), Some((name, value))) = (&section, trimmed.split_once(['=', ':'])) else {
            return Err(ParseError::InvalidSyntax(format!(
                "line {}: expected a section header or key = value",
                number + 1
            )));
        };
        let name = name.trim().to_lowercase();
        sections
            .entry(current.clone())
            .or_default()
            .insert(name.clone(), value.trim().to_string());
        key = Some(name);
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_metadata_and_options() {
        let content = "\
[metadata]
name = aiohttp
version = 3.8.6
license = Apache 2

[options]
python_requires = >=3.6
install_requires =
    attrs>=17.3.0
    charset-normalizer>=2.0,<4.0
    # pinned below
    asynctest==0.13.0; python_version<\"3.8\"

[options.extras_require]
speedups =
    aiodns
";
        let declared = SetupCfgParser.parse(content).unwrap();

        assert_eq!(declared.pkg_name, "aiohttp");
        assert_eq!(declared.pkg_ver, "3.8.6");
        assert_eq!(declared.pkg_lic, vec!["Apache 2".to_string()]);
        assert_eq!(declared.lang_ver, vec![">=3.6".to_string()]);
        assert_eq!(
            declared.pkg_dep,
            vec![
                "attrs;>=17.3.0".to_string(),
                "charset-normalizer;>=2.0, <4.0".to_string(),
                "asynctest;==0.13.0".to_string(),
            ]
        );
    }

    #[test]
    fn parse_falls_back_to_license_classifiers() {
        let content = "\
[metadata]
name = demo
classifiers =
    Programming Language :: Python :: 3
    License :: OSI Approved :: MIT License
";
        let declared = SetupCfgParser.parse(content).unwrap();

        assert_eq!(declared.pkg_lic, vec!["MIT License".to_string()]);
        assert!(declared.pkg_dep.is_empty());
    }

    #[test]
    fn parse_rejects_keys_outside_a_section() {
        assert!(matches!(
            SetupCfgParser.parse("name = orphan\n"),
            Err(ParseError::InvalidSyntax(_))
        ));
    }
}
