//! Paths into documents and resolution against the original values.
//!
//! A [`Path`] is recorded while the change tree is built and later walked
//! back into one of the two *original* documents, so presentation always
//! shows the rich value rather than its normalized comparison form.

use crate::error::ResolveError;
use crate::tree::Node;
use std::fmt;

/// A single path segment: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// An ordered sequence of segments. The root path is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new path extended by one segment.
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

/// Formats as `user.tags[0].name`; the empty path renders as `(root)`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", key)?;
                }
                Segment::Index(_) => write!(f, "{}", segment)?,
            }
        }
        Ok(())
    }
}

/// Walks `path` into `document` and returns the value found there.
///
/// # Errors
///
/// Returns [`ResolveError::Unresolvable`] naming the first segment that does
/// not exist. Typed values are leaves and cannot be walked into.
pub fn resolve<'a>(path: &Path, document: &'a Node) -> Result<&'a Node, ResolveError> {
    let mut current = document;
    for (depth, segment) in path.segments().iter().enumerate() {
        let next = match segment {
            Segment::Key(key) => current.get(key),
            Segment::Index(index) => current.at(*index),
        };
        current = next.ok_or_else(|| ResolveError::Unresolvable {
            path: path.to_string(),
            segment: segment.to_string(),
            depth,
        })?;
    }
    Ok(current)
}
