//! The structural delta between two normalized documents.
//!
//! The wire shape follows the usual JSON delta convention:
//!
//! - a mapping delta is an object from key to either a list or a nested delta;
//! - lists have one element for an addition (`[new]`), two for a whole-value
//!   update (`[old, new]`) and three for a deletion (`[old, 0, 0]`);
//! - a sequence delta carries the sentinel `"_t": "a"`; insertions and nested
//!   deltas are keyed by index (`"3"`), deletions by an underscore-prefixed
//!   original index (`"_3"`).
//!
//! Moves (`["", to, 3]`) and partial text diffs (`[patch, 0, 2]`) are part of
//! the convention but are never produced here and are rejected on input.

use crate::error::TreeError;
use crate::parser::{json_to_node, node_to_json};
use crate::tree::Node;
use std::collections::BTreeMap;
use std::fmt;

const SEQUENCE_SENTINEL_KEY: &str = "_t";
const SEQUENCE_SENTINEL_VALUE: &str = "a";
const DELETION_MARKER: f64 = 0.0;
const TEXT_DIFF_MARKER: f64 = 2.0;
const MOVE_MARKER: f64 = 3.0;

/// Key of an entry in a sequence delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SequenceKey {
    /// Final (right-side) index: insertions and nested deltas.
    Index(usize),
    /// Original (left-side) index: deletions and moves.
    Removed(usize),
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceKey::Index(index) => write!(f, "{}", index),
            SequenceKey::Removed(index) => write!(f, "_{}", index),
        }
    }
}

impl SequenceKey {
    fn parse(key: &str) -> Option<Self> {
        match key.strip_prefix('_') {
            Some(rest) => rest.parse().ok().map(SequenceKey::Removed),
            None => key.parse().ok().map(SequenceKey::Index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// A raw 1, 2 or 3 element list.
    Entry(Vec<Node>),
    Mapping(BTreeMap<String, Delta>),
    Sequence(BTreeMap<SequenceKey, Delta>),
}

/// What a raw list entry means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryKind<'a> {
    Added(&'a Node),
    Updated { old: &'a Node, new: &'a Node },
    Deleted(&'a Node),
    Moved { to: usize },
    TextDiff,
    Malformed,
}

impl Delta {
    pub fn added(value: Node) -> Self {
        Delta::Entry(vec![value])
    }

    pub fn updated(old: Node, new: Node) -> Self {
        Delta::Entry(vec![old, new])
    }

    pub fn deleted(old: Node) -> Self {
        Delta::Entry(vec![
            old,
            Node::Number(DELETION_MARKER),
            Node::Number(DELETION_MARKER),
        ])
    }

    /// True for mapping and sequence deltas, which describe a change deeper inside.
    pub fn is_nested(&self) -> bool {
        !matches!(self, Delta::Entry(_))
    }

    /// Classifies a list entry. Nested deltas are reported as malformed.
    pub fn entry_kind(&self) -> EntryKind<'_> {
        let Delta::Entry(items) = self else {
            return EntryKind::Malformed;
        };
        match items.as_slice() {
            [new] => EntryKind::Added(new),
            [old, new] => EntryKind::Updated { old, new },
            [old, Node::Number(a), Node::Number(b)]
                if *a == DELETION_MARKER && *b == DELETION_MARKER =>
            {
                EntryKind::Deleted(old)
            }
            [_, Node::Number(to), Node::Number(marker)]
                if *marker == MOVE_MARKER && *to >= 0.0 && to.fract() == 0.0 =>
            {
                EntryKind::Moved { to: *to as usize }
            }
            [_, Node::Number(a), Node::Number(marker)]
                if *a == DELETION_MARKER && *marker == TEXT_DIFF_MARKER =>
            {
                EntryKind::TextDiff
            }
            _ => EntryKind::Malformed,
        }
    }

    /// Serializes to the JSON wire shape.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Delta::Entry(items) => serde_json::Value::Array(items.iter().map(node_to_json).collect()),
            Delta::Mapping(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, delta)| (key.clone(), delta.to_json()))
                    .collect(),
            ),
            Delta::Sequence(entries) => {
                let mut obj: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(key, delta)| (key.to_string(), delta.to_json()))
                    .collect();
                obj.insert(
                    SEQUENCE_SENTINEL_KEY.to_string(),
                    serde_json::Value::String(SEQUENCE_SENTINEL_VALUE.to_string()),
                );
                serde_json::Value::Object(obj)
            }
        }
    }

    /// Parses the JSON wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::MalformedDelta`] for scalars where a delta is
    /// expected and for sequence keys that are neither `n` nor `_n`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, TreeError> {
        match value {
            serde_json::Value::Array(items) => Ok(Delta::Entry(
                items.iter().cloned().map(json_to_node).collect(),
            )),
            serde_json::Value::Object(obj) => {
                let is_sequence = obj.get(SEQUENCE_SENTINEL_KEY)
                    == Some(&serde_json::Value::String(SEQUENCE_SENTINEL_VALUE.to_string()));
                if is_sequence {
                    let mut entries = BTreeMap::new();
                    for (key, nested) in obj.iter().filter(|(k, _)| *k != SEQUENCE_SENTINEL_KEY) {
                        let seq_key = SequenceKey::parse(key).ok_or_else(|| {
                            TreeError::malformed_delta(format!("invalid sequence key '{}'", key))
                        })?;
                        entries.insert(seq_key, Delta::from_json(nested)?);
                    }
                    Ok(Delta::Sequence(entries))
                } else {
                    let mut entries = BTreeMap::new();
                    for (key, nested) in obj {
                        entries.insert(key.clone(), Delta::from_json(nested)?);
                    }
                    Ok(Delta::Mapping(entries))
                }
            }
            other => Err(TreeError::malformed_delta(format!(
                "expected a list or an object, found {}",
                other
            ))),
        }
    }
}
