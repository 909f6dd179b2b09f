//! SIDEDIFF - Side-by-side structural diff for structured documents.
//!
//! This library compares two JSON, YAML or TOML documents and reconciles the
//! structural delta between them into a navigable change tree. Each node of
//! the tree classifies one key or index as unchanged, changed, added or
//! removed, and points back into both original documents so values can be
//! shown side by side.
//!
//! # Example
//!
//! ```no_run
//! use sidediff::{parse_file, Comparison, DiffEngine, format_comparison, OutputFormat, OutputOptions};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Parse two files
//! let before = parse_file(Path::new("old.yaml"))?;
//! let after = parse_file(Path::new("new.yaml"))?;
//!
//! // Diff and reconcile them into a change tree
//! let comparison = Comparison::build(&DiffEngine::default(), before, after)?;
//!
//! // Render both sides next to each other
//! let output = format_comparison(&comparison, &OutputFormat::Terminal, &OutputOptions::default())?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod change_tree;
pub mod delta;
pub mod engine;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod path;
pub mod tree;

// Re-export commonly used types for convenience
pub use change_tree::{
    expand, expand_mapping, expand_sequence, Branch, Change, ChangeRecord, ChangeType,
    Comparison, RecordKey, Side,
};
pub use delta::{Delta, SequenceKey};
pub use engine::{DiffConfig, DiffEngine, SequenceAlgorithm};
pub use error::{OutputError, ParseError, ResolveError, SidediffError, TreeError};
pub use filter::FilterConfig;
pub use normalize::Normalizer;
pub use output::{format_comparison, DiffStats, OutputFormat, OutputOptions};
pub use parser::{
    parse_content, parse_file, parse_json, parse_stdin, parse_toml, parse_yaml, FormatHint,
};
pub use path::{resolve, Path, Segment};
pub use tree::{Node, Shape, TypedValue};
