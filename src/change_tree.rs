//! Change-tree reconciliation.
//!
//! A [`Comparison`] owns two documents, their normalized forms and the delta
//! between them. Its [`root`](Comparison::root) record is expanded on demand
//! with [`expand_mapping`] and [`expand_sequence`]; each call looks only at
//! the record it is given and returns a fresh list of child records.
//!
//! Every record classifies one key or index as unchanged, changed, added or
//! removed. The classification is a tagged [`Change`] carrying exactly the
//! branches that exist, so an added record cannot have a left branch and an
//! unchanged one cannot lack either side.
//!
//! Classification is sticky: once a record is added or removed, all of its
//! descendants are presented the same way. The locally computed type is kept
//! in [`ChangeRecord::change_type`].
//!
//! # Invariants
//!
//! - Sequence items are never `Changed`; a replaced item is a removal
//!   followed by an insertion.
//! - A mapping key whose value changes shape (leaf, mapping, sequence) is
//!   split into a removed record immediately followed by an added record.
//! - Removed sequence items report their original index; every other item
//!   reports its index in the after document.
//!
//! # Examples
//!
//! ```
//! use sidediff::{expand_mapping, parse_json, ChangeType, Comparison, DiffEngine};
//!
//! let before = parse_json("{}").unwrap();
//! let after = parse_json(r#"{"foo": "bar"}"#).unwrap();
//! let comparison = Comparison::build(&DiffEngine::default(), before, after).unwrap();
//!
//! let children = expand_mapping(&comparison.root()).unwrap();
//! assert_eq!(children.len(), 1);
//! assert_eq!(children[0].change_type(), ChangeType::Added);
//! assert!(children[0].left().is_none());
//! ```

use crate::delta::{Delta, EntryKind, SequenceKey};
use crate::engine::DiffEngine;
use crate::error::{ResolveError, TreeError};
use crate::normalize::Normalizer;
use crate::path::{resolve, Path, Segment};
use crate::tree::{Node, Shape};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Unchanged,
    Changed,
    Added,
    Removed,
}

impl ChangeType {
    /// Added and removed classifications propagate to every descendant.
    pub fn is_sticky(self) -> bool {
        matches!(self, ChangeType::Added | ChangeType::Removed)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeType::Unchanged => "unchanged",
            ChangeType::Changed => "changed",
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
        };
        write!(f, "{}", name)
    }
}

/// Which document a branch points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Before,
    After,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::Before => "before",
            Side::After => "after",
        }
    }
}

/// A location in one document together with its normalized value.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch<'a> {
    pub side: Side,
    pub path: Path,
    pub value: &'a Node,
}

impl<'a> Branch<'a> {
    fn child(&self, segment: impl Into<Segment>, value: &'a Node) -> Branch<'a> {
        Branch {
            side: self.side,
            path: self.path.child(segment),
            value,
        }
    }
}

/// Classification of a record along with the branches it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<'a> {
    Unchanged { left: Branch<'a>, right: Branch<'a> },
    Changed { left: Branch<'a>, right: Branch<'a> },
    Added { right: Branch<'a> },
    Removed { left: Branch<'a> },
}

impl<'a> Change<'a> {
    pub fn kind(&self) -> ChangeType {
        match self {
            Change::Unchanged { .. } => ChangeType::Unchanged,
            Change::Changed { .. } => ChangeType::Changed,
            Change::Added { .. } => ChangeType::Added,
            Change::Removed { .. } => ChangeType::Removed,
        }
    }

    pub fn left(&self) -> Option<&Branch<'a>> {
        match self {
            Change::Unchanged { left, .. } | Change::Changed { left, .. } => Some(left),
            Change::Removed { left } => Some(left),
            Change::Added { .. } => None,
        }
    }

    pub fn right(&self) -> Option<&Branch<'a>> {
        match self {
            Change::Unchanged { right, .. } | Change::Changed { right, .. } => Some(right),
            Change::Added { right } => Some(right),
            Change::Removed { .. } => None,
        }
    }
}

/// The key or index a record describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Root,
    Key(String),
    Index(usize),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Root => write!(f, "(root)"),
            RecordKey::Key(key) => write!(f, "{}", key),
            RecordKey::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// One classified property or item.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord<'a> {
    pub key: RecordKey,
    /// Presented classification. Under an added or removed ancestor this is
    /// the inherited classification.
    pub change: Change<'a>,
    /// Classification computed for this record alone.
    pub local_change_type: ChangeType,
    /// Delta describing changes below this record.
    pub nested_delta: Option<&'a Delta>,
}

impl<'a> ChangeRecord<'a> {
    pub fn change_type(&self) -> ChangeType {
        self.local_change_type
    }

    pub fn implicit_change_type(&self) -> ChangeType {
        self.change.kind()
    }

    pub fn left(&self) -> Option<&Branch<'a>> {
        self.change.left()
    }

    pub fn right(&self) -> Option<&Branch<'a>> {
        self.change.right()
    }

    /// Path of the record, taken from the left branch when there is one.
    pub fn path(&self) -> &Path {
        match &self.change {
            Change::Unchanged { left, .. }
            | Change::Changed { left, .. }
            | Change::Removed { left } => &left.path,
            Change::Added { right } => &right.path,
        }
    }

    /// Shape of the value whose children an expansion enumerates.
    pub fn shape(&self) -> Shape {
        self.base().map(|branch| branch.value.shape()).unwrap_or(Shape::Leaf)
    }

    /// True when the record itself originates its classification rather than
    /// inheriting it from an ancestor.
    pub fn is_origin(&self) -> bool {
        self.local_change_type == self.implicit_change_type()
    }

    fn base(&self) -> Option<&Branch<'a>> {
        if self.implicit_change_type() == ChangeType::Added {
            self.right()
        } else {
            self.left()
        }
    }
}

/// A provisional record before its classification is sealed into a [`Change`].
#[derive(Debug)]
struct Draft<'a> {
    key: RecordKey,
    local: ChangeType,
    left: Option<Branch<'a>>,
    right: Option<Branch<'a>>,
    nested_delta: Option<&'a Delta>,
}

impl<'a> Draft<'a> {
    fn shapes_differ(&self) -> bool {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => left.value.shape() != right.value.shape(),
            _ => false,
        }
    }

    fn split(self) -> (Draft<'a>, Draft<'a>) {
        let removed = Draft {
            key: self.key.clone(),
            local: ChangeType::Removed,
            left: self.left,
            right: None,
            nested_delta: None,
        };
        let added = Draft {
            key: self.key,
            local: ChangeType::Added,
            left: None,
            right: self.right,
            nested_delta: None,
        };
        (removed, added)
    }

    /// Checks the branches against the classification and builds the record.
    fn seal(self, inherited: ChangeType, at: &Path) -> Result<ChangeRecord<'a>, TreeError> {
        let kind = if inherited.is_sticky() {
            inherited
        } else {
            self.local
        };
        let missing = |side: &'static str| TreeError::MissingBranch {
            at: at.to_string(),
            key: self.key.to_string(),
            side,
        };

        let change = match (kind, self.left, self.right) {
            (ChangeType::Unchanged, Some(left), Some(right)) => Change::Unchanged { left, right },
            (ChangeType::Changed, Some(left), Some(right)) => Change::Changed { left, right },
            (ChangeType::Added, None, Some(right)) => Change::Added { right },
            (ChangeType::Removed, Some(left), None) => Change::Removed { left },
            (ChangeType::Added, Some(_), _) | (ChangeType::Removed, _, Some(_)) => {
                return Err(TreeError::malformed(
                    at,
                    &self.key,
                    format!("{} record carries both branches", kind),
                ));
            }
            (ChangeType::Added, None, None) => return Err(missing("right")),
            (_, None, _) => return Err(missing("left")),
            (_, _, None) => return Err(missing("right")),
        };

        Ok(ChangeRecord {
            key: self.key,
            change,
            local_change_type: self.local,
            nested_delta: self.nested_delta,
        })
    }
}

/// Two documents under comparison, with the delta between them.
#[derive(Debug, Clone)]
pub struct Comparison {
    before: Node,
    after: Node,
    before_normalized: Node,
    after_normalized: Node,
    delta: Option<Delta>,
}

impl Comparison {
    /// Normalizes both documents and diffs them with `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotADocument`] when either side is not a mapping.
    pub fn build(engine: &DiffEngine, before: Node, after: Node) -> Result<Self, TreeError> {
        ensure_document(&before, Side::Before)?;
        ensure_document(&after, Side::After)?;

        let normalizer = engine.normalizer();
        let before_normalized = normalizer.normalize(&before);
        let after_normalized = normalizer.normalize(&after);
        let delta = engine.diff(&before_normalized, &after_normalized);

        debug!(changed = delta.is_some(), "built comparison");

        Ok(Self {
            before,
            after,
            before_normalized,
            after_normalized,
            delta,
        })
    }

    /// Uses a delta computed elsewhere. It must describe the normalized forms
    /// of `before` and `after` as produced by `normalizer`.
    pub fn with_delta(
        normalizer: &Normalizer,
        before: Node,
        after: Node,
        delta: Option<Delta>,
    ) -> Result<Self, TreeError> {
        ensure_document(&before, Side::Before)?;
        ensure_document(&after, Side::After)?;

        if let Some(Delta::Entry(_)) = &delta {
            return Err(TreeError::malformed_delta(
                "a document delta must be a mapping delta",
            ));
        }

        Ok(Self {
            before_normalized: normalizer.normalize(&before),
            after_normalized: normalizer.normalize(&after),
            before,
            after,
            delta,
        })
    }

    /// The root record: both documents at the empty path.
    pub fn root(&self) -> ChangeRecord<'_> {
        ChangeRecord {
            key: RecordKey::Root,
            change: Change::Unchanged {
                left: Branch {
                    side: Side::Before,
                    path: Path::root(),
                    value: &self.before_normalized,
                },
                right: Branch {
                    side: Side::After,
                    path: Path::root(),
                    value: &self.after_normalized,
                },
            },
            local_change_type: ChangeType::Unchanged,
            nested_delta: self.delta.as_ref(),
        }
    }

    pub fn delta(&self) -> Option<&Delta> {
        self.delta.as_ref()
    }

    pub fn has_changes(&self) -> bool {
        self.delta.is_some()
    }

    /// The original (not normalized) document on `side`.
    pub fn document(&self, side: Side) -> &Node {
        match side {
            Side::Before => &self.before,
            Side::After => &self.after,
        }
    }

    /// Fetches the original value a branch points at, for display.
    ///
    /// # Errors
    ///
    /// A [`ResolveError`] means the change tree and the documents are out of sync.
    pub fn resolve_value(&self, branch: &Branch<'_>) -> Result<&Node, ResolveError> {
        resolve(&branch.path, self.document(branch.side))
    }
}

fn ensure_document(node: &Node, side: Side) -> Result<(), TreeError> {
    match node {
        Node::Object(_) => Ok(()),
        _ => Err(TreeError::NotADocument { side: side.name() }),
    }
}

/// Expands a record by the shape of its value. Leaves have no children.
pub fn expand<'a>(record: &ChangeRecord<'a>) -> Result<Vec<ChangeRecord<'a>>, TreeError> {
    match record.shape() {
        Shape::Mapping => expand_mapping(record),
        Shape::Sequence => expand_sequence(record),
        Shape::Leaf => Ok(Vec::new()),
    }
}

/// Lists the properties of a mapping record, classified against its delta.
///
/// # Errors
///
/// Fails with a [`TreeError`] when the record is not a mapping, or when its
/// delta names a key the base mapping lacks or carries a malformed entry.
pub fn expand_mapping<'a>(record: &ChangeRecord<'a>) -> Result<Vec<ChangeRecord<'a>>, TreeError> {
    let at = record.path().clone();
    let implicit = record.implicit_change_type();
    let left = record.left();
    let right = record.right();

    let base = record.base().ok_or_else(|| TreeError::MissingBranch {
        at: at.to_string(),
        key: record.key.to_string(),
        side: "base",
    })?;
    let base_map = as_mapping(base.value, &at)?;
    let right_map = right.map(|r| as_mapping(r.value, &at)).transpose()?;

    let mut drafts: Vec<Draft<'a>> = base_map
        .keys()
        .map(|key| Draft {
            key: RecordKey::Key(key.clone()),
            local: ChangeType::Unchanged,
            left: left.and_then(|l| l.value.get(key).map(|value| l.child(key.as_str(), value))),
            right: right.and_then(|r| {
                right_map
                    .and_then(|map| map.get(key))
                    .map(|value| r.child(key.as_str(), value))
            }),
            nested_delta: None,
        })
        .collect();

    if let Some(delta) = record.nested_delta {
        let Delta::Mapping(entries) = delta else {
            return Err(TreeError::malformed_delta(format!(
                "expected a mapping delta at {}",
                at
            )));
        };
        for (key, entry) in entries {
            apply_property_entry(&mut drafts, key, entry, right, &at)?;
        }
    }

    while let Some(index) = drafts
        .iter()
        .position(|d| d.local == ChangeType::Changed && d.shapes_differ())
    {
        let draft = drafts.remove(index);
        debug!(at = %at, key = %draft.key, "splitting shape change into removal and addition");
        let (removed, added) = draft.split();
        drafts.insert(index, added);
        drafts.insert(index, removed);
    }

    let records = drafts
        .into_iter()
        .map(|draft| draft.seal(implicit, &at))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(at = %at, children = records.len(), "expanded mapping");
    Ok(records)
}

fn apply_property_entry<'a>(
    drafts: &mut Vec<Draft<'a>>,
    key: &str,
    entry: &'a Delta,
    right: Option<&Branch<'a>>,
    at: &Path,
) -> Result<(), TreeError> {
    let existing = drafts
        .iter()
        .position(|d| matches!(&d.key, RecordKey::Key(k) if k == key));
    let unknown = || TreeError::UnknownKey {
        at: at.to_string(),
        key: key.to_string(),
    };
    let right_branch = || {
        right.ok_or_else(|| TreeError::MissingBranch {
            at: at.to_string(),
            key: key.to_string(),
            side: "right",
        })
    };

    if entry.is_nested() {
        let index = existing.ok_or_else(unknown)?;
        drafts[index].nested_delta = Some(entry);
        return Ok(());
    }

    match entry.entry_kind() {
        EntryKind::Added(value) => {
            if existing.is_some() {
                return Err(TreeError::DuplicateKey {
                    at: at.to_string(),
                    key: key.to_string(),
                });
            }
            drafts.push(Draft {
                key: RecordKey::Key(key.to_string()),
                local: ChangeType::Added,
                left: None,
                right: Some(right_branch()?.child(key, value)),
                nested_delta: None,
            });
        }
        EntryKind::Updated { new, .. } => {
            let index = existing.ok_or_else(unknown)?;
            let branch = right_branch()?.child(key, new);
            let draft = &mut drafts[index];
            draft.local = ChangeType::Changed;
            draft.right = Some(branch);
        }
        EntryKind::Deleted(_) => {
            let index = existing.ok_or_else(unknown)?;
            let draft = &mut drafts[index];
            draft.local = ChangeType::Removed;
            draft.right = None;
        }
        EntryKind::Moved { .. } => {
            return Err(TreeError::malformed(
                at,
                key,
                "move entries are only meaningful in sequences",
            ));
        }
        EntryKind::TextDiff => {
            return Err(TreeError::TextDiffNotSupported {
                at: at.to_string(),
                key: key.to_string(),
            });
        }
        EntryKind::Malformed => {
            return Err(TreeError::malformed(at, key, entry_length_reason(entry)));
        }
    }
    Ok(())
}

/// An item slot during sequence reconciliation.
#[derive(Debug)]
struct Slot<'a> {
    local: ChangeType,
    /// Index in the base sequence; `None` for inserted items.
    original: Option<usize>,
    /// Index in the after sequence (the original index for removed items).
    position: usize,
    left: Option<Branch<'a>>,
    inserted: Option<&'a Node>,
    nested_delta: Option<&'a Delta>,
}

impl Slot<'_> {
    fn is_live(&self) -> bool {
        self.local != ChangeType::Removed
    }
}

/// Lists the items of a sequence record, classified against its delta.
///
/// Removals are applied first, in the original index space, then insertions
/// in the final index space. Nested deltas address final indices.
///
/// # Errors
///
/// Fails with a [`TreeError`] when the record is not a sequence, when an index
/// is out of range, or when the delta holds a move or a same-slot replacement.
pub fn expand_sequence<'a>(
    record: &ChangeRecord<'a>,
) -> Result<Vec<ChangeRecord<'a>>, TreeError> {
    let at = record.path().clone();
    let implicit = record.implicit_change_type();
    let left = record.left();
    let right = record.right();

    let base = record.base().ok_or_else(|| TreeError::MissingBranch {
        at: at.to_string(),
        key: record.key.to_string(),
        side: "base",
    })?;
    let base_items = as_sequence(base.value, &at)?;
    let right_items = right.map(|r| as_sequence(r.value, &at)).transpose()?;

    let mut slots: Vec<Slot<'a>> = (0..base_items.len())
        .map(|index| Slot {
            local: ChangeType::Unchanged,
            original: Some(index),
            position: index,
            left: left.and_then(|l| l.value.at(index).map(|value| l.child(index, value))),
            inserted: None,
            nested_delta: None,
        })
        .collect();

    if let Some(delta) = record.nested_delta {
        let Delta::Sequence(entries) = delta else {
            return Err(TreeError::malformed_delta(format!(
                "expected a sequence delta at {}",
                at
            )));
        };
        apply_item_removals(&mut slots, entries, &at)?;
        apply_item_insertions(&mut slots, entries, right.is_some(), &at)?;
        apply_item_nested(&mut slots, entries, &at)?;
    }

    let records = slots
        .into_iter()
        .map(|slot| {
            let index = if slot.is_live() {
                slot.position
            } else {
                slot.original.unwrap_or(slot.position)
            };
            let right_branch = match (slot.local, right) {
                (ChangeType::Removed, _) | (_, None) => None,
                (ChangeType::Added, Some(r)) => slot.inserted.map(|value| r.child(index, value)),
                (_, Some(r)) => {
                    let value = right_items
                        .and_then(|items| items.get(index))
                        .ok_or_else(|| TreeError::UnknownIndex {
                            at: at.to_string(),
                            index,
                        })?;
                    Some(r.child(index, value))
                }
            };
            Draft {
                key: RecordKey::Index(index),
                local: slot.local,
                left: slot.left,
                right: right_branch,
                nested_delta: slot.nested_delta,
            }
            .seal(implicit, &at)
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(at = %at, children = records.len(), "expanded sequence");
    Ok(records)
}

fn apply_item_removals(
    slots: &mut [Slot<'_>],
    entries: &BTreeMap<SequenceKey, Delta>,
    at: &Path,
) -> Result<(), TreeError> {
    for (key, entry) in entries {
        let SequenceKey::Removed(index) = *key else {
            continue;
        };
        match entry.entry_kind() {
            EntryKind::Deleted(_) => {}
            EntryKind::Moved { .. } => {
                return Err(TreeError::MoveNotSupported {
                    at: at.to_string(),
                    index,
                });
            }
            _ => {
                return Err(TreeError::malformed(
                    at,
                    key,
                    "deletion keys must carry [old, 0, 0]",
                ));
            }
        }

        let slot = slots
            .iter_mut()
            .find(|s| s.original == Some(index))
            .ok_or_else(|| TreeError::UnknownIndex {
                at: at.to_string(),
                index,
            })?;
        slot.local = ChangeType::Removed;

        for slot in slots.iter_mut() {
            if slot.is_live() && slot.original.is_some_and(|original| original > index) {
                slot.position -= 1;
            }
        }
    }
    Ok(())
}

fn apply_item_insertions<'a>(
    slots: &mut Vec<Slot<'a>>,
    entries: &'a BTreeMap<SequenceKey, Delta>,
    has_right: bool,
    at: &Path,
) -> Result<(), TreeError> {
    for (key, entry) in entries {
        let SequenceKey::Index(index) = *key else {
            continue;
        };
        if entry.is_nested() {
            continue;
        }
        let value = match entry.entry_kind() {
            EntryKind::Added(value) => value,
            EntryKind::Updated { .. } => {
                return Err(TreeError::SameSlotReplacement {
                    at: at.to_string(),
                    index,
                });
            }
            EntryKind::Deleted(_) | EntryKind::Moved { .. } => {
                return Err(TreeError::MoveNotSupported {
                    at: at.to_string(),
                    index,
                });
            }
            EntryKind::TextDiff => {
                return Err(TreeError::TextDiffNotSupported {
                    at: at.to_string(),
                    key: key.to_string(),
                });
            }
            EntryKind::Malformed => {
                return Err(TreeError::malformed(at, key, entry_length_reason(entry)));
            }
        };
        if !has_right {
            return Err(TreeError::MissingBranch {
                at: at.to_string(),
                key: key.to_string(),
                side: "right",
            });
        }

        let live = slots.iter().filter(|s| s.is_live()).count();
        if index > live {
            return Err(TreeError::UnknownIndex {
                at: at.to_string(),
                index,
            });
        }

        let insert_at = slots
            .iter()
            .position(|s| s.is_live() && s.position >= index)
            .unwrap_or(slots.len());
        for slot in slots.iter_mut() {
            if slot.is_live() && slot.position >= index {
                slot.position += 1;
            }
        }
        slots.insert(
            insert_at,
            Slot {
                local: ChangeType::Added,
                original: None,
                position: index,
                left: None,
                inserted: Some(value),
                nested_delta: None,
            },
        );
    }
    Ok(())
}

fn apply_item_nested<'a>(
    slots: &mut [Slot<'a>],
    entries: &'a BTreeMap<SequenceKey, Delta>,
    at: &Path,
) -> Result<(), TreeError> {
    for (key, entry) in entries {
        let SequenceKey::Index(index) = *key else {
            continue;
        };
        if !entry.is_nested() {
            continue;
        }
        let slot = slots
            .iter_mut()
            .find(|s| s.local == ChangeType::Unchanged && s.position == index)
            .ok_or_else(|| TreeError::UnknownIndex {
                at: at.to_string(),
                index,
            })?;
        slot.nested_delta = Some(entry);
    }
    Ok(())
}

fn as_mapping<'n>(node: &'n Node, at: &Path) -> Result<&'n BTreeMap<String, Node>, TreeError> {
    match node {
        Node::Object(map) => Ok(map),
        other => Err(TreeError::ShapeMismatch {
            at: at.to_string(),
            expected: Shape::Mapping,
            found: other.shape(),
        }),
    }
}

fn as_sequence<'n>(node: &'n Node, at: &Path) -> Result<&'n [Node], TreeError> {
    match node {
        Node::Array(items) => Ok(items),
        other => Err(TreeError::ShapeMismatch {
            at: at.to_string(),
            expected: Shape::Sequence,
            found: other.shape(),
        }),
    }
}

fn entry_length_reason(entry: &Delta) -> String {
    match entry {
        Delta::Entry(items) => format!("unexpected {}-element entry", items.len()),
        _ => "expected a list entry".to_string(),
    }
}
