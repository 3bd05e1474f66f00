//! Ruby manifests: `*.gemspec` and `Gemfile`
//!
//! Both are Ruby source, so only the conventional one-line forms are read:
//! - gemspec: `spec.name = "x"`, `spec.license(s)`, `spec.required_ruby_version`,
//!   `spec.add_dependency` / `spec.add_runtime_dependency`
//! - Gemfile: `gem "name", "~> 1.0"` outside development/test groups, `ruby "3.2"`

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry};

/// Quoted string literal, single or double quotes
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']*)["']"#).expect("quoted regex is valid"));
/// `spec.field = ...`
static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+\.(name|version|license|licenses|required_ruby_version)\s*=\s*(.+)$")
        .expect("assignment regex is valid")
});
/// `spec.add_dependency ...` and `spec.add_runtime_dependency ...`
static DEPENDENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+\.add_(?:runtime_)?dependency\b\s*\(?(.+)$").expect("dependency regex is valid")
});
/// `group :development, :test do`
static GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^group\s+(.+?)\s+do$").expect("group regex is valid"));

/// Drop a trailing `# comment` and surrounding whitespace
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => line[..pos].trim(),
        None => line.trim(),
    }
}

fn quoted_values(text: &str) -> Vec<String> {
    QUOTED_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// `"name", "~> 1.0", ">= 1.0.1"` -> `name;~> 1.0, >= 1.0.1`
fn gem_entry(arguments: &str) -> Option<String> {
    let values = quoted_values(arguments);
    let (name, requirements) = values.split_first()?;
    Some(dep_entry(name, &requirements.join(", ")))
}

/// Parser for *.gemspec files
pub struct GemspecParser;

impl ManifestParser for GemspecParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename.ends_with(".gemspec")
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let mut declared = DeclaredDeps::default();

        for line in content.lines() {
            let line = strip_comment(line);

            if let Some(caps) = DEPENDENCY_RE.captures(line) {
                if let Some(entry) = gem_entry(&caps[1]) {
                    declared.pkg_dep.push(entry);
                }
                continue;
            }

            let Some(caps) = ASSIGNMENT_RE.captures(line) else {
                continue;
            };
            let values = quoted_values(&caps[2]);
            let first = values.first().cloned().unwrap_or_default();
            match &caps[1] {
                "name" => declared.pkg_name = first,
                "version" => declared.pkg_ver = first,
                "license" | "licenses" => declared.pkg_lic = values,
                "required_ruby_version" => declared.lang_ver = values,
                _ => {}
            }
        }

        Ok(declared)
    }
}

/// Parser for Gemfile
pub struct GemfileParser;

impl ManifestParser for GemfileParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename == "Gemfile"
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        let mut declared = DeclaredDeps::default();
        let mut skipping_group = false;

        for line in content.lines() {
            let line = strip_comment(line);

            if let Some(caps) = GROUP_RE.captures(line) {
                skipping_group = caps[1].contains("development") || caps[1].contains("test");
            } else if line == "end" {
                skipping_group = false;
            } else if let Some(arguments) = line.strip_prefix("gem ") {
                if !skipping_group
                    && let Some(entry) = gem_entry(arguments)
                {
                    declared.pkg_dep.push(entry);
                }
            } else if let Some(arguments) = line.strip_prefix("ruby ") {
                declared.lang_ver.extend(quoted_values(arguments));
            }
        }

        Ok(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemspec_extracts_metadata_and_runtime_dependencies() {
        let content = r#"
Gem::Specification.new do |spec|
  spec.name          = "faraday"
  spec.version       = "2.7.4"
  spec.licenses      = ["MIT"]
  spec.required_ruby_version = ">= 2.6"

  spec.add_dependency "faraday-net_http", ">= 2.0", "< 3.1"
  spec.add_runtime_dependency 'ruby2_keywords', '>= 0.0.4'
  spec.add_development_dependency "rspec", "~> 3.0" # tests only
end
"#;
        let declared = GemspecParser.parse(content).unwrap();

        assert_eq!(declared.pkg_name, "faraday");
        assert_eq!(declared.pkg_ver, "2.7.4");
        assert_eq!(declared.pkg_lic, vec!["MIT".to_string()]);
        assert_eq!(declared.lang_ver, vec![">= 2.6".to_string()]);
        assert_eq!(
            declared.pkg_dep,
            vec![
                "faraday-net_http;>= 2.0, < 3.1".to_string(),
                "ruby2_keywords;>= 0.0.4".to_string(),
            ]
        );
    }

    #[test]
    fn gemfile_skips_development_groups() {
        let content = r#"
source "https://rubygems.org"
ruby "3.2.2"

gem "rails", "~> 7.1.0"
gem "pg"

group :development, :test do
  gem "rspec-rails"
end

gem "puma", ">= 5.0"
"#;
        let declared = GemfileParser.parse(content).unwrap();

        assert_eq!(declared.lang_ver, vec!["3.2.2".to_string()]);
        assert_eq!(
            declared.pkg_dep,
            vec![
                "rails;~> 7.1.0".to_string(),
                "pg;latest".to_string(),
                "puma;>= 5.0".to_string(),
            ]
        );
    }
}
