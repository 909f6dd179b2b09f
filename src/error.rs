//! Custom error types for sidediff.

use crate::tree::Shape;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read file {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not detect file format for {path}")]
    UnknownFormat { path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Unknown output format: {format}")]
    UnknownFormat { format: String },

    #[error("Failed to serialize to JSON: {source}")]
    JsonSerializationError {
        #[source]
        source: serde_json::Error,
    },
}

/// Input-contract violations raised while building the change tree.
///
/// Each one means the delta and the documents it describes disagree. The
/// comparison is aborted; nothing is downgraded to a partial tree. `at` is
/// the display form of the parent path.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TreeError {
    #[error("delta references key '{key}' absent from the base mapping at {at}")]
    UnknownKey { at: String, key: String },

    #[error("delta references index {index} absent from the base sequence at {at}")]
    UnknownIndex { at: String, index: usize },

    #[error("malformed delta entry for '{key}' at {at}: {reason}")]
    MalformedEntry {
        at: String,
        key: String,
        reason: String,
    },

    #[error("delta adds key '{key}' that already exists at {at}")]
    DuplicateKey { at: String, key: String },

    #[error("sequence move at index {index} under {at} is not supported")]
    MoveNotSupported { at: String, index: usize },

    #[error("same-slot replacement at index {index} under {at} is not supported")]
    SameSlotReplacement { at: String, index: usize },

    #[error("partial text diff for '{key}' at {at} is not supported")]
    TextDiffNotSupported { at: String, key: String },

    #[error("expected a {expected} at {at}, found a {found}")]
    ShapeMismatch {
        at: String,
        expected: Shape,
        found: Shape,
    },

    #[error("record '{key}' at {at} is missing its {side} branch")]
    MissingBranch {
        at: String,
        key: String,
        side: &'static str,
    },

    #[error("the {side} document is not a mapping")]
    NotADocument { side: &'static str },

    #[error("malformed delta: {reason}")]
    MalformedDelta { reason: String },
}

/// The change tree and the documents have desynchronized.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("cannot resolve {path}: segment {segment} at depth {depth} does not exist")]
    Unresolvable {
        path: String,
        segment: String,
        depth: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SidediffError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },
}

impl ParseError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn read_error(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn json_error(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonError {
            path: path.into(),
            source,
        }
    }

    pub fn yaml_error(path: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::YamlError {
            path: path.into(),
            source,
        }
    }

    pub fn toml_error(path: impl Into<String>, source: toml::de::Error) -> Self {
        Self::TomlError {
            path: path.into(),
            source,
        }
    }

    pub fn unknown_format(path: impl Into<String>) -> Self {
        Self::UnknownFormat { path: path.into() }
    }
}

impl TreeError {
    pub(crate) fn malformed(
        at: impl ToString,
        key: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedEntry {
            at: at.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_delta(reason: impl Into<String>) -> Self {
        Self::MalformedDelta {
            reason: reason.into(),
        }
    }
}
