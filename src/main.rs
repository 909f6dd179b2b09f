//! SIDEDIFF command-line interface.
//!
//! This is the main entry point for the sidediff CLI tool. It uses clap for
//! argument parsing and wires together the library modules: parse both
//! documents, build the change tree, render it side by side.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use sidediff::{
    format_comparison, parse_file, parse_stdin, Comparison, Delta, DiffConfig,
    DiffEngine, FilterConfig, FormatHint, Node, OutputFormat, OutputOptions, SequenceAlgorithm,
    SidediffError,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Narrowest usable before column.
const MIN_COLUMN_WIDTH: usize = 8;

/// SIDEDIFF - Side-by-side structural diff for structured data
///
/// Compares two JSON, YAML or TOML documents and shows every changed key
/// with its before and after values next to each other.
#[derive(Parser)]
#[command(name = "sidediff")]
#[command(version)]
#[command(about = "Side-by-side structural diff for structured data", long_about = None)]
#[command(author = "SIDEDIFF Contributors")]
struct Cli {
    /// Before document (`-` reads standard input)
    #[arg(value_name = "FILE1")]
    file1: PathBuf,

    /// After document (`-` reads standard input)
    #[arg(value_name = "FILE2")]
    file2: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "terminal")]
    format: OutputFormatArg,

    /// Format of documents read from standard input
    #[arg(long, value_enum, default_value = "auto")]
    input_format: InputFormatArg,

    /// Show only changes (hide unchanged fields)
    #[arg(short, long, default_value_t = true, overrides_with = "full")]
    compact: bool,

    /// Show every record, including unchanged ones
    #[arg(long, overrides_with = "compact")]
    full: bool,

    /// Maximum length for displayed values
    #[arg(long, default_value = "80")]
    max_value_length: usize,

    /// Width of the before column
    #[arg(short, long, default_value = "48")]
    width: usize,

    /// Ignore whitespace differences in strings
    #[arg(long)]
    ignore_whitespace: bool,

    /// Sequence correlation algorithm
    #[arg(long, value_enum, default_value = "myers")]
    algorithm: AlgorithmArg,

    /// Use a precomputed JSON delta instead of diffing the documents
    #[arg(long, value_name = "DELTA")]
    delta: Option<PathBuf>,

    /// Hide paths matching a glob pattern (repeatable)
    #[arg(long, value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Show only paths matching a glob pattern (repeatable)
    #[arg(long, value_name = "PATTERN")]
    only: Vec<String>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (only show changes, suppress summary)
    #[arg(short, long)]
    quiet: bool,
}

/// Output format argument for clap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormatArg {
    /// Colored side-by-side output
    Terminal,
    /// Nested JSON record tree
    Json,
    /// Side-by-side plain text (no colors)
    Plain,
    /// Raw structural delta
    Delta,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Terminal => OutputFormat::Terminal,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
            OutputFormatArg::Delta => OutputFormat::Delta,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum InputFormatArg {
    Auto,
    Json,
    Yaml,
    Toml,
}

impl From<InputFormatArg> for FormatHint {
    fn from(arg: InputFormatArg) -> Self {
        match arg {
            InputFormatArg::Auto => FormatHint::Auto,
            InputFormatArg::Json => FormatHint::Json,
            InputFormatArg::Yaml => FormatHint::Yaml,
            InputFormatArg::Toml => FormatHint::Toml,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum AlgorithmArg {
    Myers,
    Patience,
    Lcs,
}

impl From<AlgorithmArg> for SequenceAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Myers => SequenceAlgorithm::Myers,
            AlgorithmArg::Patience => SequenceAlgorithm::Patience,
            AlgorithmArg::Lcs => SequenceAlgorithm::Lcs,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sidediff=debug" } else { "sidediff=warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn read_document(path: &Path, hint: FormatHint) -> Result<Node> {
    info!(path = %path.display(), "parsing document");
    if path.as_os_str() == "-" {
        Ok(parse_stdin(hint)?)
    } else {
        Ok(parse_file(path)?)
    }
}

fn read_delta(path: &Path) -> Result<Option<Delta>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read delta file: {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Delta file is not valid JSON: {}", path.display()))?;
    if json.is_null() || json.as_object().is_some_and(|map| map.is_empty()) {
        return Ok(None);
    }
    Ok(Some(Delta::from_json(&json)?))
}

fn run(cli: Cli) -> Result<i32> {
    if cli.file1.as_os_str() == "-" && cli.file2.as_os_str() == "-" {
        bail!("Only one of the two documents can be read from standard input");
    }
    if cli.width < MIN_COLUMN_WIDTH {
        return Err(SidediffError::ConfigError {
            message: format!("--width must be at least {}", MIN_COLUMN_WIDTH),
        }
        .into());
    }

    let hint = FormatHint::from(cli.input_format);
    let before = read_document(&cli.file1, hint)
        .with_context(|| format!("Failed to parse first file: {}", cli.file1.display()))?;
    let after = read_document(&cli.file2, hint)
        .with_context(|| format!("Failed to parse second file: {}", cli.file2.display()))?;

    let diff_config = DiffConfig {
        ignore_whitespace: cli.ignore_whitespace,
        sequence_algorithm: cli.algorithm.into(),
    };
    let engine = DiffEngine::from_config(&diff_config);

    let comparison = match &cli.delta {
        Some(path) => {
            let delta = read_delta(path)?;
            Comparison::with_delta(engine.normalizer(), before, after, delta)
        }
        None => Comparison::build(&engine, before, after),
    }
    .context("Failed to compare documents")?;

    debug!(changed = comparison.has_changes(), "comparison ready");

    let filter = cli
        .ignore
        .iter()
        .fold(FilterConfig::new(), |config, pattern| config.ignore(pattern));
    let filter = cli
        .only
        .iter()
        .fold(filter, |config, pattern| config.only(pattern));

    let output_options = OutputOptions {
        compact: cli.compact && !cli.full,
        max_value_length: cli.max_value_length,
        column_width: cli.width,
        filter,
    };

    let output_format: OutputFormat = cli.format.into();
    let output = format_comparison(&comparison, &output_format, &output_options)
        .context("Failed to format diff output")?;

    if !cli.quiet {
        println!("{}", output);
    } else {
        for line in output.lines() {
            if !line.starts_with("Summary:") && !line.trim().is_empty() {
                println!("{}", line);
            }
        }
    }

    if comparison.has_changes() {
        Ok(1)
    } else {
        Ok(0)
    }
}
