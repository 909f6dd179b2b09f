//! Output formatting for change trees.
//!
//! This module walks a [`Comparison`] and renders it in one of several
//! formats: a side-by-side view (terminal with colors, or plain text), a
//! nested JSON record tree, or the raw delta. Display values are always
//! resolved from the original documents, so typed scalars keep their tags.
//!
//! # Examples
//!
//! ```
//! use sidediff::{parse_json, Comparison, DiffEngine, format_comparison, OutputFormat, OutputOptions};
//!
//! let old = parse_json(r#"{"age": 42}"#).unwrap();
//! let new = parse_json(r#"{"age": 43}"#).unwrap();
//! let comparison = Comparison::build(&DiffEngine::default(), old, new).unwrap();
//!
//! let output = format_comparison(&comparison, &OutputFormat::Plain, &OutputOptions::default()).unwrap();
//! assert!(output.contains("42"));
//! assert!(output.contains("43"));
//! ```

use crate::change_tree::{expand, Branch, ChangeRecord, ChangeType, Comparison};
use crate::error::{OutputError, SidediffError};
use crate::filter::{FilterConfig, Visibility};
use crate::parser::node_to_json;
use crate::path::Path;
use crate::tree::{Node, Shape};
use colored::*;
use std::str::FromStr;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored side-by-side output with ANSI escape codes
    Terminal,
    /// Nested JSON record tree
    Json,
    /// Side-by-side plain text, no colors (suitable for piping)
    Plain,
    /// The raw structural delta in its JSON wire shape
    Delta,
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            "plain" => Ok(OutputFormat::Plain),
            "delta" => Ok(OutputFormat::Delta),
            _ => Err(OutputError::UnknownFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Options for controlling output formatting.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Hide unchanged records and keep added/removed subtrees collapsed
    pub compact: bool,
    /// Maximum length for displayed values (truncate if longer)
    pub max_value_length: usize,
    /// Width of the left (before) column in side-by-side output
    pub column_width: usize,
    /// Path filters applied to every record
    pub filter: FilterConfig,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            compact: true,
            max_value_length: 80,
            column_width: 48,
            filter: FilterConfig::default(),
        }
    }
}

/// Counts of records that originate a change.
///
/// Descendants of an added or removed record inherit its classification and
/// are not counted again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
}

impl DiffStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of changes.
    pub fn total_changes(&self) -> usize {
        self.added + self.removed + self.changed
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }

    fn record(&mut self, kind: ChangeType) {
        match kind {
            ChangeType::Added => self.added += 1,
            ChangeType::Removed => self.removed += 1,
            ChangeType::Changed => self.changed += 1,
            ChangeType::Unchanged => {}
        }
    }
}

/// A record prepared for display, with values resolved from the originals.
#[derive(Debug, Clone)]
pub struct RenderedRecord<'c> {
    pub label: String,
    pub change: ChangeType,
    pub local_change: ChangeType,
    pub left: Option<(Path, &'c Node)>,
    pub right: Option<(Path, &'c Node)>,
    pub children: Vec<RenderedRecord<'c>>,
}

/// Walks the change tree and collects the visible records plus statistics.
///
/// # Errors
///
/// Propagates contract violations from expansion and resolution failures.
pub fn collect_records<'c>(
    comparison: &'c Comparison,
    options: &OutputOptions,
) -> Result<(Vec<RenderedRecord<'c>>, DiffStats), SidediffError> {
    let root = comparison.root();
    let mut stats = DiffStats::new();
    let visibility = options.filter.visibility(root.path(), Visibility::Ancestor);
    if visibility == Visibility::Hidden {
        return Ok((Vec::new(), stats));
    }
    let records = walk(comparison, &root, visibility, options, &mut stats)?;
    Ok((records, stats))
}

fn walk<'c>(
    comparison: &'c Comparison,
    record: &ChangeRecord<'c>,
    visibility: Visibility,
    options: &OutputOptions,
    stats: &mut DiffStats,
) -> Result<Vec<RenderedRecord<'c>>, SidediffError> {
    let mut rendered = Vec::new();

    for child in expand(record)? {
        let child_visibility = options.filter.visibility(child.path(), visibility);
        if child_visibility == Visibility::Hidden {
            continue;
        }

        let kind = child.implicit_change_type();
        if child_visibility == Visibility::Subtree && child.is_origin() {
            stats.record(kind);
        }

        let quiet = kind == ChangeType::Unchanged && child.nested_delta.is_none();
        if options.compact && quiet {
            continue;
        }

        let descend = child.shape() != Shape::Leaf
            && kind != ChangeType::Changed
            && !(options.compact && kind.is_sticky());
        let children = if descend {
            walk(comparison, &child, child_visibility, options, stats)?
        } else {
            Vec::new()
        };

        if child_visibility == Visibility::Ancestor && children.is_empty() {
            continue;
        }

        rendered.push(RenderedRecord {
            label: child.key.to_string(),
            change: kind,
            local_change: child.change_type(),
            left: resolve_side(comparison, child.left())?,
            right: resolve_side(comparison, child.right())?,
            children,
        });
    }

    Ok(rendered)
}

fn resolve_side<'c>(
    comparison: &'c Comparison,
    branch: Option<&Branch<'_>>,
) -> Result<Option<(Path, &'c Node)>, SidediffError> {
    match branch {
        Some(branch) => {
            let value = comparison.resolve_value(branch)?;
            Ok(Some((branch.path.clone(), value)))
        }
        None => Ok(None),
    }
}

/// Formats a comparison according to the specified format and options.
///
/// # Errors
///
/// Fails when the delta does not fit the documents, or when JSON
/// serialization fails.
pub fn format_comparison(
    comparison: &Comparison,
    format: &OutputFormat,
    options: &OutputOptions,
) -> Result<String, SidediffError> {
    match format {
        OutputFormat::Delta => Ok(format_delta(comparison)?),
        OutputFormat::Terminal | OutputFormat::Plain | OutputFormat::Json => {
            let (records, stats) = collect_records(comparison, options)?;
            match format {
                OutputFormat::Json => Ok(format_json(&records, &stats)?),
                _ => Ok(format_side_by_side(
                    &records,
                    &stats,
                    options,
                    *format == OutputFormat::Terminal,
                )),
            }
        }
    }
}

/// Formats the raw delta; an empty object when nothing changed.
fn format_delta(comparison: &Comparison) -> Result<String, OutputError> {
    let delta = comparison
        .delta()
        .map(|d| d.to_json())
        .unwrap_or_else(|| serde_json::json!({}));
    serde_json::to_string_pretty(&delta)
        .map_err(|e| OutputError::JsonSerializationError { source: e })
}

fn format_side_by_side(
    records: &[RenderedRecord<'_>],
    stats: &DiffStats,
    options: &OutputOptions,
    colored: bool,
) -> String {
    if records.is_empty() || (options.compact && stats.is_empty()) {
        let message = "No changes detected.";
        return if colored {
            message.dimmed().to_string()
        } else {
            message.to_string()
        };
    }

    let mut lines = Vec::new();
    push_rows(records, 0, options, colored, &mut lines);

    let mut output = lines.join("\n");
    output.push_str("\n\n");
    output.push_str(&format_summary(stats));
    output
}

fn push_rows(
    records: &[RenderedRecord<'_>],
    depth: usize,
    options: &OutputOptions,
    colored: bool,
    lines: &mut Vec<String>,
) {
    for record in records {
        lines.push(format_row(record, depth, options, colored));
        push_rows(&record.children, depth + 1, options, colored, lines);
    }
}

/// Formats one side-by-side row: `marker before-cell │ after-cell`.
fn format_row(
    record: &RenderedRecord<'_>,
    depth: usize,
    options: &OutputOptions,
    colored: bool,
) -> String {
    let indent = "  ".repeat(depth);
    let cell = |side: &Option<(Path, &Node)>| match side {
        Some((_, value)) => format!(
            "{}{}: {}",
            indent,
            record.label,
            value.preview(options.max_value_length)
        ),
        None => String::new(),
    };

    let left = fit(&cell(&record.left), options.column_width);
    let right = cell(&record.right);
    let marker = change_marker(record.change);

    if !colored {
        return format!("{} {} │ {}", marker, left, right).trim_end().to_string();
    }

    let (marker, left, right) = match record.change {
        ChangeType::Added => (
            marker.bright_green(),
            left.normal(),
            right.green(),
        ),
        ChangeType::Removed => (marker.bright_red(), left.red(), right.normal()),
        ChangeType::Changed => (marker.bright_yellow(), left.yellow(), right.yellow()),
        ChangeType::Unchanged => (marker.normal(), left.dimmed(), right.dimmed()),
    };
    format!("{} {} {} {}", marker, left, "│".dimmed(), right)
        .trim_end()
        .to_string()
}

fn change_marker(change: ChangeType) -> &'static str {
    match change {
        ChangeType::Added => "+",
        ChangeType::Removed => "-",
        ChangeType::Changed => "~",
        ChangeType::Unchanged => " ",
    }
}

/// Pads or truncates `text` to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        format!("{}{}", text, " ".repeat(width - len))
    } else if width <= 1 {
        text.chars().take(width).collect()
    } else {
        let kept: String = text.chars().take(width - 1).collect();
        format!("{}…", kept)
    }
}

/// Formats summary statistics.
pub fn format_summary(stats: &DiffStats) -> String {
    if stats.is_empty() {
        return "Summary: No changes".to_string();
    }

    let mut parts = Vec::new();
    if stats.added > 0 {
        parts.push(format!("{} added", stats.added));
    }
    if stats.removed > 0 {
        parts.push(format!("{} removed", stats.removed));
    }
    if stats.changed > 0 {
        parts.push(format!("{} changed", stats.changed));
    }

    format!("Summary: {}", parts.join(", "))
}

fn format_json(records: &[RenderedRecord<'_>], stats: &DiffStats) -> Result<String, OutputError> {
    use serde_json::json;

    let output = json!({
        "records": records.iter().map(record_to_json).collect::<Vec<_>>(),
        "stats": {
            "added": stats.added,
            "removed": stats.removed,
            "changed": stats.changed,
        }
    });

    serde_json::to_string_pretty(&output)
        .map_err(|e| OutputError::JsonSerializationError { source: e })
}

fn record_to_json(record: &RenderedRecord<'_>) -> serde_json::Value {
    use serde_json::json;

    let side = |side: &Option<(Path, &Node)>| {
        side.as_ref().map(|(path, value)| {
            json!({
                "path": path.to_string(),
                "value": node_to_json(value),
            })
        })
    };

    json!({
        "key": record.label,
        "change": record.change,
        "local_change": record.local_change,
        "left": side(&record.left),
        "right": side(&record.right),
        "children": record.children.iter().map(record_to_json).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DiffEngine;
    use crate::parser::parse_json;

    fn compare(before: &str, after: &str) -> Comparison {
        Comparison::build(
            &DiffEngine::default(),
            parse_json(before).unwrap(),
            parse_json(after).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("abc", 3), "abc");
    }

    #[test]
    fn test_format_summary() {
        assert_eq!(format_summary(&DiffStats::new()), "Summary: No changes");
        let stats = DiffStats {
            added: 2,
            removed: 0,
            changed: 1,
        };
        assert_eq!(format_summary(&stats), "Summary: 2 added, 1 changed");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_compact_hides_unchanged() {
        let comparison = compare(r#"{"a": 1, "b": 2}"#, r#"{"a": 1, "b": 3}"#);
        let (records, stats) = collect_records(&comparison, &OutputOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "b");
        assert_eq!(stats.changed, 1);
    }

    #[test]
    fn test_full_mode_descends_into_added_subtrees() {
        let comparison = compare("{}", r#"{"foo": {"bar": 1}}"#);
        let options = OutputOptions {
            compact: false,
            ..Default::default()
        };
        let (records, stats) = collect_records(&comparison, &options).unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(records[0].children.len(), 1);
        assert_eq!(records[0].children[0].change, ChangeType::Added);
        assert_eq!(records[0].children[0].local_change, ChangeType::Unchanged);
    }

    #[test]
    fn test_plain_row_layout() {
        let comparison = compare(r#"{"age": 30}"#, r#"{"age": 31}"#);
        let options = OutputOptions {
            column_width: 12,
            ..Default::default()
        };
        let output = format_comparison(&comparison, &OutputFormat::Plain, &options).unwrap();
        let first = output.lines().next().unwrap();
        assert_eq!(first, "~ age: 30      │ age: 31");
        assert!(output.ends_with("Summary: 1 changed"));
    }

    #[test]
    fn test_plain_no_changes() {
        let comparison = compare(r#"{"a": 1}"#, r#"{"a": 1}"#);
        let output =
            format_comparison(&comparison, &OutputFormat::Plain, &OutputOptions::default()).unwrap();
        assert_eq!(output, "No changes detected.");
    }
}
