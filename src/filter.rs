//! Path filtering for rendered change trees.
//!
//! This module provides glob-style pattern matching over record paths,
//! allowing users to ignore specific paths or focus on particular areas.
//!
//! # Pattern Syntax
//!
//! - `foo` - matches literal key "foo"
//! - `[0]` or `0` - matches sequence index 0
//! - `*` - matches any single path segment
//! - `**` - matches any number of path segments (including zero)
//! - `foo.bar` - matches nested path "foo.bar"
//! - `**.version` - matches "version" at any depth
//!
//! # Examples
//!
//! ```
//! use sidediff::filter::PathPattern;
//! use sidediff::Path;
//!
//! let pattern = PathPattern::parse("**.version");
//! assert!(pattern.matches(&Path::root().child("package").child("version")));
//!
//! let pattern = PathPattern::parse("items[0].id");
//! assert!(pattern.matches(&Path::root().child("items").child(0usize).child("id")));
//! ```

use crate::path::{Path, Segment};

/// A single segment in a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Matches a mapping key exactly
    Literal(String),
    /// Matches a sequence index exactly
    Index(usize),
    /// Matches any single path segment (*)
    SingleWildcard,
    /// Matches any number of path segments (**)
    DoubleWildcard,
}

impl PatternSegment {
    fn matches(&self, segment: &Segment) -> bool {
        match (self, segment) {
            (PatternSegment::SingleWildcard, _) => true,
            (PatternSegment::Literal(lit), Segment::Key(key)) => lit == key,
            (PatternSegment::Literal(lit), Segment::Index(index)) => {
                lit.parse::<usize>().is_ok_and(|n| n == *index)
            }
            (PatternSegment::Index(n), Segment::Index(index)) => n == index,
            _ => false,
        }
    }
}

/// A compiled path pattern for matching against record paths.
#[derive(Debug, Clone)]
pub struct PathPattern {
    pub segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let mut segments = Vec::new();
        for part in pattern.split('.').filter(|p| !p.is_empty()) {
            // `items[0][1]` splits into a key followed by index segments
            let (head, indices) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            match head {
                "" => {}
                "**" => segments.push(PatternSegment::DoubleWildcard),
                "*" => segments.push(PatternSegment::SingleWildcard),
                _ => segments.push(PatternSegment::Literal(head.to_string())),
            }
            for index in indices
                .split(['[', ']'])
                .filter(|s| !s.is_empty())
            {
                match index {
                    "*" => segments.push(PatternSegment::SingleWildcard),
                    _ => match index.parse() {
                        Ok(n) => segments.push(PatternSegment::Index(n)),
                        Err(_) => segments.push(PatternSegment::Literal(index.to_string())),
                    },
                }
            }
        }
        Self { segments }
    }

    pub fn matches(&self, path: &Path) -> bool {
        matches_recursive(&self.segments, path.segments())
    }

    /// True when some descendant of `path` could still match.
    pub fn may_match_below(&self, path: &Path) -> bool {
        prefix_recursive(&self.segments, path.segments())
    }
}

fn matches_recursive(pattern: &[PatternSegment], path: &[Segment]) -> bool {
    match (pattern.first(), path.first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some(_), None) => pattern
            .iter()
            .all(|s| matches!(s, PatternSegment::DoubleWildcard)),
        (Some(PatternSegment::DoubleWildcard), Some(_)) => {
            matches_recursive(&pattern[1..], path) || matches_recursive(pattern, &path[1..])
        }
        (Some(seg), Some(path_seg)) => {
            seg.matches(path_seg) && matches_recursive(&pattern[1..], &path[1..])
        }
    }
}

fn prefix_recursive(pattern: &[PatternSegment], path: &[Segment]) -> bool {
    match (pattern.first(), path.first()) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(PatternSegment::DoubleWildcard), Some(_)) => true,
        (Some(seg), Some(path_seg)) => {
            seg.matches(path_seg) && prefix_recursive(&pattern[1..], &path[1..])
        }
    }
}

/// Visibility of a record under a [`FilterConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Show the record and everything below it
    Subtree,
    /// Show the record as context for a match further down
    Ancestor,
    Hidden,
}

/// Configuration for filtering rendered records.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Patterns for paths to ignore (exclude from output)
    pub ignore_patterns: Vec<PathPattern>,
    /// Patterns for paths to include (if non-empty, only these are shown)
    pub only_patterns: Vec<PathPattern>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.ignore_patterns.push(PathPattern::parse(pattern));
        self
    }

    pub fn only(mut self, pattern: &str) -> Self {
        self.only_patterns.push(PathPattern::parse(pattern));
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.ignore_patterns.is_empty() || !self.only_patterns.is_empty()
    }

    /// Decides how a record at `path` is shown, given how its parent was
    /// shown. Ignored paths hide their whole subtree; `only` patterns keep
    /// ancestors of matches visible and everything below a match.
    pub fn visibility(&self, path: &Path, parent: Visibility) -> Visibility {
        if parent == Visibility::Hidden || self.ignore_patterns.iter().any(|p| p.matches(path)) {
            return Visibility::Hidden;
        }

        if parent == Visibility::Subtree
            || self.only_patterns.is_empty()
            || self.only_patterns.iter().any(|p| p.matches(path))
        {
            return Visibility::Subtree;
        }

        if self.only_patterns.iter().any(|p| p.may_match_below(path)) {
            Visibility::Ancestor
        } else {
            Visibility::Hidden
        }
    }
}
