//! Tree-sitter helpers shared by the TOML manifest parsers

use tracing::warn;
use tree_sitter::{Node, Tree};

use crate::parser::traits::ParseError;

pub fn parse_tree(content: &str) -> Result<Tree, ParseError> {
    let mut parser = tree_sitter::Parser::new();
    let language = tree_sitter_toml_ng::LANGUAGE;
    parser.set_language(&language.into()).map_err(|e| {
        warn!("Failed to set TOML language for tree-sitter: {}", e);
        ParseError::TreeSitter(e.to_string())
    })?;

    let tree = parser.parse(content, None).ok_or_else(|| {
        warn!("Failed to parse TOML content");
        ParseError::ParseFailed("Failed to parse TOML".to_string())
    })?;

    if tree.root_node().has_error() {
        return Err(ParseError::InvalidSyntax("malformed TOML".to_string()));
    }

    Ok(tree)
}

/// Header name of a `[table]` node, e.g. `tool.poetry.dependencies`
pub fn table_name(table: Node, content: &str) -> Option<String> {
    if table.kind() != "table" {
        return None;
    }
    let mut cursor = table.walk();
    table
        .children(&mut cursor)
        .find(|child| matches!(child.kind(), "bare_key" | "dotted_key" | "quoted_key"))
        .map(|key| normalize_key(&content[key.byte_range()]))
}

/// Header name of a `[[array.table]]` element
pub fn array_table_name(element: Node, content: &str) -> Option<String> {
    if element.kind() != "table_array_element" {
        return None;
    }
    let mut cursor = element.walk();
    element
        .children(&mut cursor)
        .find(|child| matches!(child.kind(), "bare_key" | "dotted_key" | "quoted_key"))
        .map(|key| normalize_key(&content[key.byte_range()]))
}

/// All `key = value` pairs directly under a node
pub fn pairs(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == "pair")
        .collect()
}

/// Key of a pair with quotes and surrounding whitespace removed
pub fn pair_key(pair: Node, content: &str) -> Option<String> {
    let key = pair.named_child(0)?;
    Some(normalize_key(&content[key.byte_range()]))
}

/// Value node of a pair
pub fn pair_value(pair: Node) -> Option<Node> {
    let count = pair.named_child_count();
    if count < 2 {
        return None;
    }
    pair.named_child(u32::try_from(count - 1).ok()?)
}

/// Look up a key inside an inline table or a `[table]`
pub fn lookup<'tree>(node: Node<'tree>, content: &str, key: &str) -> Option<Node<'tree>> {
    pairs(node)
        .into_iter()
        .find(|pair| pair_key(*pair, content).as_deref() == Some(key))
        .and_then(pair_value)
}

/// Text of a string node without its delimiters
pub fn string_value(node: Node, content: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = content[node.byte_range()].trim();
    let unquoted = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find_map(|quote| {
            text.strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        })
        .unwrap_or(text);
    Some(unquoted.trim().to_string())
}

/// Every string element of an array node
pub fn string_array(node: Node, content: &str) -> Vec<String> {
    if node.kind() != "array" {
        return Vec::new();
    }
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter_map(|child| string_value(child, content))
        .collect()
}

fn normalize_key(raw: &str) -> String {
    raw.split('.')
        .map(|part| part.trim().trim_matches('"').trim_matches('\''))
        .collect::<Vec<_>>()
        .join(".")
}
