//! Comparison-friendly normalization of documents.
//!
//! Normalization keeps the composite shape of a document (mappings stay
//! mappings, sequences stay sequences) and turns every leaf into a primitive
//! that compares and hashes by value. Typed scalars collapse to their
//! canonical text, or to the serialized form of their representation when
//! they have none.
//!
//! Numbers that JSON cannot carry (NaN and the infinities) become the text
//! `NaN`, `inf` or `-inf`, and `-0` becomes `0`, so that value equality and
//! the identity hash agree on every leaf.

use crate::parser::node_to_json;
use crate::tree::Node;

/// Converts documents into their comparison form and fingerprints values.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    /// Trim and collapse runs of whitespace in string leaves.
    pub ignore_whitespace: bool,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignoring_whitespace() -> Self {
        Self {
            ignore_whitespace: true,
        }
    }

    /// Returns the comparison form of `node`.
    pub fn normalize(&self, node: &Node) -> Node {
        match node {
            Node::Null => Node::Null,
            Node::Bool(b) => Node::Bool(*b),
            Node::Number(n) => normalize_number(*n),
            Node::String(s) => Node::String(self.normalize_text(s)),
            Node::Object(map) => Node::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.normalize(v)))
                    .collect(),
            ),
            Node::Array(items) => Node::Array(items.iter().map(|v| self.normalize(v)).collect()),
            Node::Typed(typed) => {
                let text = match typed.canonical_text() {
                    Some(text) => text,
                    None => node_to_json(&self.normalize(&typed.repr)).to_string(),
                };
                Node::String(self.normalize_text(&text))
            }
        }
    }

    /// Deterministic fingerprint of the normalized value.
    ///
    /// Values that normalize identically hash identically, whatever their
    /// original rich type. Mapping keys are sorted, so the serialization is
    /// stable across runs.
    pub fn identity_hash(&self, node: &Node) -> String {
        node_to_json(&self.normalize(node)).to_string()
    }

    fn normalize_text(&self, text: &str) -> String {
        if self.ignore_whitespace {
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            text.to_string()
        }
    }
}

fn normalize_number(n: f64) -> Node {
    if n.is_nan() {
        Node::String("NaN".to_string())
    } else if n == f64::INFINITY {
        Node::String("inf".to_string())
    } else if n == f64::NEG_INFINITY {
        Node::String("-inf".to_string())
    } else if n == 0.0 {
        Node::Number(0.0)
    } else {
        Node::Number(n)
    }
}
