//! Value model for structured documents.

use std::collections::BTreeMap;
use std::fmt;

/// A node representing a value in structured data (JSON, YAML, TOML).
///
/// Mapping keys are kept sorted so that traversal order, rendering, and
/// identity hashes are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(BTreeMap<String, Node>),
    Array(Vec<Node>),
    /// A rich scalar carrying a type discriminator (YAML tag, TOML datetime).
    Typed(TypedValue),
}

/// A domain scalar with an explicit type tag and its structured representation.
///
/// A typed value is always a leaf, even when its representation is a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub tag: String,
    pub repr: Box<Node>,
}

impl TypedValue {
    pub fn new(tag: impl Into<String>, repr: Node) -> Self {
        Self {
            tag: tag.into(),
            repr: Box::new(repr),
        }
    }

    /// Returns the canonical textual form, if the representation has one.
    ///
    /// Strings, numbers and booleans have a textual form; nulls and composite
    /// representations do not and must be serialized instead.
    pub fn canonical_text(&self) -> Option<String> {
        match self.repr.as_ref() {
            Node::String(s) => Some(s.clone()),
            Node::Number(n) => Some(format_number(*n)),
            Node::Bool(b) => Some(b.to_string()),
            Node::Typed(inner) => inner.canonical_text(),
            Node::Null | Node::Object(_) | Node::Array(_) => None,
        }
    }
}

/// Coarse value category used to detect shape changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Sequence,
    Mapping,
    Leaf,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Sequence => write!(f, "sequence"),
            Shape::Mapping => write!(f, "mapping"),
            Shape::Leaf => write!(f, "leaf"),
        }
    }
}

impl Node {
    pub fn type_name(&self) -> &str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Object(_) => "object",
            Node::Array(_) => "array",
            Node::Typed(typed) => &typed.tag,
        }
    }

    /// Classifies the node as a sequence, a mapping, or a leaf.
    pub fn shape(&self) -> Shape {
        match self {
            Node::Object(_) => Shape::Mapping,
            Node::Array(_) => Shape::Sequence,
            _ => Shape::Leaf,
        }
    }

    /// Looks up a key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Looks up an index in a sequence node.
    pub fn at(&self, index: usize) -> Option<&Node> {
        match self {
            Node::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Returns a short preview of the node's value, truncated to max_len.
    pub fn preview(&self, max_len: usize) -> String {
        let preview = match self {
            Node::Null => "null".to_string(),
            Node::Bool(b) => b.to_string(),
            Node::Number(n) => format_number(*n),
            Node::String(s) => format!("\"{}\"", s),
            Node::Object(map) => {
                let count = map.len();
                if count == 0 {
                    "{}".to_string()
                } else if count == 1 {
                    format!("{{ {} key }}", count)
                } else {
                    format!("{{ {} keys }}", count)
                }
            }
            Node::Array(arr) => {
                let count = arr.len();
                if count == 0 {
                    "[]".to_string()
                } else if count == 1 {
                    format!("[ {} item ]", count)
                } else {
                    format!("[ {} items ]", count)
                }
            }
            Node::Typed(typed) => match typed.canonical_text() {
                Some(text) => format!("!{} {}", typed.tag, text),
                None => format!("!{} {}", typed.tag, typed.repr.preview(max_len)),
            },
        };

        truncate(preview, max_len)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn truncate(text: String, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text;
    }
    let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}
