//! NuGet `.nuspec` parser
//!
//! Only `<license type="expression">` is read as a license; file licenses
//! cannot be classified without downloading the package. Dependencies are
//! collected from every target-framework group and deduplicated.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::warn;

use crate::parser::traits::{ManifestParser, ParseError};
use crate::parser::types::{DeclaredDeps, dep_entry, split_license_expression};

/// Parsed nuspec document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NuspecDocument {
    pub declared: DeclaredDeps,
    /// `<repository url="...">`
    pub repository: Option<String>,
}

/// Parser for *.nuspec files
pub struct NuspecParser;

impl NuspecParser {
    pub fn new() -> Self {
        Self
    }

    pub fn read(content: &str) -> Result<NuspecDocument, ParseError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut document = NuspecDocument::default();
        let mut path: Vec<String> = Vec::new();
        let mut license_is_expression = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let tag = local_name(e);
                    if tag == "license" {
                        license_is_expression =
                            attribute(e, "type").as_deref() == Some("expression");
                    }
                    Self::handle_element(&tag, e, &mut document);
                    path.push(tag);
                }
                Ok(Event::Empty(ref e)) => {
                    let tag = local_name(e);
                    Self::handle_element(&tag, e, &mut document);
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().map(|t| t.trim().to_string()).unwrap_or_default();
                    if text.is_empty() {
                        buf.clear();
                        continue;
                    }
                    let in_metadata =
                        path.iter().rev().nth(1).map(String::as_str) == Some("metadata");
                    match path.last().map(String::as_str) {
                        Some("id") if in_metadata => document.declared.pkg_name = text,
                        Some("version") if in_metadata => document.declared.pkg_ver = text,
                        Some("license") if in_metadata && license_is_expression => {
                            document.declared.pkg_lic = split_license_expression(&text);
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(_)) => {
                    path.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    warn!("Failed to parse nuspec: {}", e);
                    return Err(ParseError::InvalidSyntax(e.to_string()));
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(document)
    }

    fn handle_element(tag: &str, element: &BytesStart, document: &mut NuspecDocument) {
        match tag {
            "dependency" => {
                let Some(id) = attribute(element, "id") else {
                    return;
                };
                let version = attribute(element, "version").unwrap_or_default();
                let entry = dep_entry(&id, &version);
                if !document.declared.pkg_dep.contains(&entry) {
                    document.declared.pkg_dep.push(entry);
                }
            }
            "repository" => {
                if let Some(url) = attribute(element, "url") {
                    document.repository = Some(url);
                }
            }
            _ => {}
        }
    }
}

impl Default for NuspecParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestParser for NuspecParser {
    fn can_parse(&self, filename: &str) -> bool {
        filename.ends_with(".nuspec")
    }

    fn parse(&self, content: &str) -> Result<DeclaredDeps, ParseError> {
        Self::read(content).map(|document| document.declared)
    }
}

fn local_name(element: &BytesStart) -> String {
    String::from_utf8_lossy(element.name().local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart, name: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
