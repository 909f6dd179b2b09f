//! File parsing for JSON, YAML and TOML formats.
//!
//! This module handles parsing structured data files into our value model.
//! It supports automatic format detection based on file extension, and falls
//! back to attempting JSON, then YAML, then TOML if the extension is unknown.
//!
//! Rich scalars survive parsing as [`Node::Typed`]: YAML tagged values keep
//! their tag, and TOML date-times are tagged `datetime`.
//!
//! # Examples
//!
//! ```no_run
//! use sidediff::parser::parse_file;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let node = parse_file(Path::new("config.yaml"))?;
//! # Ok(())
//! # }
//! ```

use crate::error::ParseError;
use crate::tree::{Node, TypedValue};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Tag given to TOML date-time values.
pub const DATETIME_TAG: &str = "datetime";

/// Which parser to use for raw content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    Json,
    Yaml,
    Toml,
    /// Try JSON, then YAML, then TOML.
    Auto,
}

impl FormatHint {
    /// Picks a hint from a file extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("json") => FormatHint::Json,
            Some("yaml") | Some("yml") => FormatHint::Yaml,
            Some("toml") => FormatHint::Toml,
            _ => FormatHint::Auto,
        }
    }
}

/// Parses a file into a Node.
///
/// # Errors
///
/// This function will return an error if:
/// - The file does not exist (`ParseError::FileNotFound`)
/// - The file cannot be read (`ParseError::ReadError`)
/// - The file contains invalid JSON, YAML or TOML for its extension
/// - The file format cannot be determined (`ParseError::UnknownFormat`)
pub fn parse_file(path: &Path) -> Result<Node, ParseError> {
    let display = path.to_string_lossy().to_string();

    if !path.exists() {
        return Err(ParseError::file_not_found(display));
    }

    let content = fs::read_to_string(path).map_err(|e| ParseError::read_error(&display, e))?;

    parse_content(&content, FormatHint::from_path(path), &display)
}

/// Reads standard input to the end and parses it.
pub fn parse_stdin(hint: FormatHint) -> Result<Node, ParseError> {
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| ParseError::read_error("<stdin>", e))?;
    parse_content(&content, hint, "<stdin>")
}

/// Parses raw content with the given format hint. `origin` names the source
/// in error messages.
pub fn parse_content(content: &str, hint: FormatHint, origin: &str) -> Result<Node, ParseError> {
    match hint {
        FormatHint::Json => parse_json(content).map_err(|e| ParseError::json_error(origin, e)),
        FormatHint::Yaml => parse_yaml(content).map_err(|e| ParseError::yaml_error(origin, e)),
        FormatHint::Toml => parse_toml(content).map_err(|e| ParseError::toml_error(origin, e)),
        FormatHint::Auto => parse_json(content)
            .ok()
            .or_else(|| parse_yaml(content).ok())
            .or_else(|| parse_toml(content).ok())
            .ok_or_else(|| ParseError::unknown_format(origin)),
    }
}

/// Parses a JSON string into a Node.
///
/// ```
/// use sidediff::parser::parse_json;
///
/// let node = parse_json(r#"{"name": "Alice", "age": 30}"#).unwrap();
/// assert_eq!(node.type_name(), "object");
/// ```
pub fn parse_json(content: &str) -> Result<Node, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    Ok(json_to_node(value))
}

/// Parses a YAML string into a Node.
pub fn parse_yaml(content: &str) -> Result<Node, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    Ok(yaml_to_node(value))
}

/// Parses a TOML document into a Node. The top level is always a table.
pub fn parse_toml(content: &str) -> Result<Node, toml::de::Error> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(toml_to_node(toml::Value::Table(table)))
}

/// Converts a serde_json::Value to our Node representation.
pub fn json_to_node(value: serde_json::Value) -> Node {
    match value {
        serde_json::Value::Null => Node::Null,
        serde_json::Value::Bool(b) => Node::Bool(b),
        serde_json::Value::Number(n) => Node::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Node::String(s),
        serde_json::Value::Array(arr) => Node::Array(arr.into_iter().map(json_to_node).collect()),
        serde_json::Value::Object(obj) => {
            let map: BTreeMap<String, Node> =
                obj.into_iter().map(|(k, v)| (k, json_to_node(v))).collect();
            Node::Object(map)
        }
    }
}

/// Converts a Node back to JSON. Typed values become `{"$type", "$value"}`
/// objects so that no information is lost.
pub fn node_to_json(node: &Node) -> serde_json::Value {
    use serde_json::json;

    match node {
        Node::Null => json!(null),
        Node::Bool(b) => json!(b),
        Node::Number(n) => json!(n),
        Node::String(s) => json!(s),
        Node::Array(arr) => serde_json::Value::Array(arr.iter().map(node_to_json).collect()),
        Node::Object(map) => {
            let obj: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), node_to_json(v)))
                .collect();
            serde_json::Value::Object(obj)
        }
        Node::Typed(typed) => json!({
            "$type": typed.tag,
            "$value": node_to_json(&typed.repr),
        }),
    }
}

/// Converts a serde_yaml::Value to our Node representation.
///
/// Non-string keys in YAML maps are converted to strings. Tagged values keep
/// their tag (without the leading `!`) as a typed scalar.
fn yaml_to_node(value: serde_yaml::Value) -> Node {
    match value {
        serde_yaml::Value::Null => Node::Null,
        serde_yaml::Value::Bool(b) => Node::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                Node::Number(f)
            } else if let Some(i) = n.as_i64() {
                Node::Number(i as f64)
            } else if let Some(u) = n.as_u64() {
                Node::Number(u as f64)
            } else {
                Node::Number(0.0)
            }
        }
        serde_yaml::Value::String(s) => Node::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Node::Array(seq.into_iter().map(yaml_to_node).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let tree: BTreeMap<String, Node> = map
                .into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_node(v)))
                .collect();
            Node::Object(tree)
        }
        serde_yaml::Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let tag = tag.trim_start_matches('!').to_string();
            Node::Typed(TypedValue::new(tag, yaml_to_node(tagged.value)))
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => format!("{:?}", other),
    }
}

fn toml_to_node(value: toml::Value) -> Node {
    match value {
        toml::Value::String(s) => Node::String(s),
        toml::Value::Integer(i) => Node::Number(i as f64),
        toml::Value::Float(f) => Node::Number(f),
        toml::Value::Boolean(b) => Node::Bool(b),
        toml::Value::Datetime(dt) => {
            Node::Typed(TypedValue::new(DATETIME_TAG, Node::String(dt.to_string())))
        }
        toml::Value::Array(arr) => Node::Array(arr.into_iter().map(toml_to_node).collect()),
        toml::Value::Table(table) => Node::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_node(v)))
                .collect(),
        ),
    }
}
