//! Structural diff producing a [`Delta`].
//!
//! The engine walks two normalized trees in parallel:
//!
//! - equal values produce no delta;
//! - mappings are compared key by key, recursing into keys present on both sides;
//! - sequences are correlated element by element using the normalizer's
//!   identity hash and a sequence diff from the `similar` crate; an element
//!   that is not matched is removed at its old index and inserted at its new
//!   one, so moves and same-slot replacements are never emitted;
//! - anything else, including any pair of strings, is a whole-value update.
//!
//! # Examples
//!
//! ```
//! use sidediff::{parse_json, DiffEngine, Normalizer};
//!
//! let engine = DiffEngine::new(Normalizer::new());
//! let old = parse_json(r#"{"age": 30}"#).unwrap();
//! let new = parse_json(r#"{"age": 31}"#).unwrap();
//!
//! let delta = engine.diff(&old, &new).unwrap();
//! assert_eq!(delta.to_json(), serde_json::json!({"age": [30.0, 31.0]}));
//! ```

use crate::delta::{Delta, SequenceKey};
use crate::normalize::Normalizer;
use crate::tree::Node;
use similar::{capture_diff_slices, Algorithm, DiffTag};
use std::collections::BTreeMap;
use tracing::trace;

/// Sequence correlation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl From<SequenceAlgorithm> for Algorithm {
    fn from(algorithm: SequenceAlgorithm) -> Self {
        match algorithm {
            SequenceAlgorithm::Myers => Algorithm::Myers,
            SequenceAlgorithm::Patience => Algorithm::Patience,
            SequenceAlgorithm::Lcs => Algorithm::Lcs,
        }
    }
}

/// Configuration for the diff engine.
#[derive(Debug, Clone, Default)]
pub struct DiffConfig {
    /// Normalize whitespace in strings (trim and collapse multiple spaces)
    pub ignore_whitespace: bool,
    /// How sequence elements are correlated across versions
    pub sequence_algorithm: SequenceAlgorithm,
}

/// Computes deltas between normalized trees.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    normalizer: Normalizer,
    algorithm: SequenceAlgorithm,
}

impl DiffEngine {
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            algorithm: SequenceAlgorithm::default(),
        }
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        let normalizer = if config.ignore_whitespace {
            Normalizer::ignoring_whitespace()
        } else {
            Normalizer::new()
        };
        Self::new(normalizer).with_algorithm(config.sequence_algorithm)
    }

    pub fn with_algorithm(mut self, algorithm: SequenceAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Returns the delta turning `left` into `right`, or `None` when they are equal.
    ///
    /// Both sides are expected to be normalized already.
    pub fn diff(&self, left: &Node, right: &Node) -> Option<Delta> {
        if left == right {
            return None;
        }

        match (left, right) {
            (Node::Object(old_map), Node::Object(new_map)) => self.diff_mappings(old_map, new_map),
            (Node::Array(old_items), Node::Array(new_items)) => {
                self.diff_sequences(old_items, new_items)
            }
            _ => Some(Delta::updated(left.clone(), right.clone())),
        }
    }

    fn diff_mappings(
        &self,
        old_map: &BTreeMap<String, Node>,
        new_map: &BTreeMap<String, Node>,
    ) -> Option<Delta> {
        let mut entries = BTreeMap::new();

        for (key, old_value) in old_map {
            match new_map.get(key) {
                Some(new_value) => {
                    if let Some(nested) = self.diff(old_value, new_value) {
                        entries.insert(key.clone(), nested);
                    }
                }
                None => {
                    entries.insert(key.clone(), Delta::deleted(old_value.clone()));
                }
            }
        }

        for (key, new_value) in new_map {
            if !old_map.contains_key(key) {
                entries.insert(key.clone(), Delta::added(new_value.clone()));
            }
        }

        if entries.is_empty() {
            None
        } else {
            Some(Delta::Mapping(entries))
        }
    }

    fn diff_sequences(&self, old_items: &[Node], new_items: &[Node]) -> Option<Delta> {
        let old_hashes: Vec<String> = old_items
            .iter()
            .map(|item| self.normalizer.identity_hash(item))
            .collect();
        let new_hashes: Vec<String> = new_items
            .iter()
            .map(|item| self.normalizer.identity_hash(item))
            .collect();

        let mut entries = BTreeMap::new();
        for op in capture_diff_slices(self.algorithm.into(), &old_hashes, &new_hashes) {
            trace!(?op, "sequence op");
            match op.tag() {
                DiffTag::Equal => {}
                DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => {
                    for index in op.old_range() {
                        entries.insert(
                            SequenceKey::Removed(index),
                            Delta::deleted(old_items[index].clone()),
                        );
                    }
                    for index in op.new_range() {
                        entries.insert(
                            SequenceKey::Index(index),
                            Delta::added(new_items[index].clone()),
                        );
                    }
                }
            }
        }

        if entries.is_empty() {
            None
        } else {
            Some(Delta::Sequence(entries))
        }
    }
}
