//! Command line and environment configuration
//!
//! Every option can also come from a `DOCJOIN_*` variable, and the binary
//! loads a `.env` file before parsing.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::align::AlignOptions;
use crate::source::Codec;

pub const DEFAULT_PROGRESS_EVERY: u64 = 1_000_000;

#[derive(Debug, Parser)]
#[command(name = "docjoin")]
#[command(about = "Join aligned document index pairs with per-document column files")]
#[command(
    long_about = "Provide pairs of document indices (line numbers) and find the data (columns) \
                  for these documents in line based files. Output format: \
                  INDEX1<tab>[COLUMNS1...]<tab>INDEX2<tab>[COLUMNS2...]"
)]
pub struct JoinArgs {
    /// Pairs of document indices, sorted by the first column ('-' for stdin)
    #[arg(long, env = "DOCJOIN_INDICES", default_value = "-")]
    pub indices: PathBuf,

    /// Column files for the first document of each pair, in output order
    #[arg(long = "columns1", num_args = 1.., required = true)]
    pub columns1: Vec<PathBuf>,

    /// Column files for the second document of each pair, in output order
    #[arg(long = "columns2", num_args = 1.., required = true)]
    pub columns2: Vec<PathBuf>,

    /// Where to write joined records ('-' for stdout)
    #[arg(long, env = "DOCJOIN_OUTPUT", default_value = "-")]
    pub output: PathBuf,

    /// Compression of the input files
    #[arg(long, env = "DOCJOIN_CODEC", value_enum, default_value_t = Codec::Auto)]
    pub codec: Codec,

    /// Fail instead of buffering more than this many side-B rows
    #[arg(long, env = "DOCJOIN_MAX_LOOKAHEAD", value_parser = parse_positive)]
    pub max_lookahead: Option<usize>,

    /// Warn when this many side-B rows are buffered (0 disables)
    #[arg(long, env = "DOCJOIN_LOOKAHEAD_WARN", default_value_t = crate::align::state::DEFAULT_LOOKAHEAD_WARN)]
    pub lookahead_warn: usize,

    /// Log progress every N pairs (0 disables)
    #[arg(long, env = "DOCJOIN_PROGRESS_EVERY", default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: u64,

    /// Write a JSON run summary to this file
    #[arg(long)]
    pub stats: Option<PathBuf>,
}

fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Where the index pairs come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

/// Where joined records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Stdout,
    File(PathBuf),
}

fn is_dash(path: &Path) -> bool {
    path.as_os_str().is_empty() || path == Path::new("-")
}

/// Validated settings for one run
#[derive(Debug, Clone)]
pub struct JoinConfig {
    pub indices: InputSource,
    pub columns1: Vec<PathBuf>,
    pub columns2: Vec<PathBuf>,
    pub output: OutputSink,
    pub codec: Codec,
    pub options: AlignOptions,
    pub progress_every: u64,
    pub stats_path: Option<PathBuf>,
}

impl JoinConfig {
    /// Defaults: pairs from stdin, records to stdout, codec by extension
    pub fn new(columns1: Vec<PathBuf>, columns2: Vec<PathBuf>) -> Self {
        Self {
            indices: InputSource::Stdin,
            columns1,
            columns2,
            output: OutputSink::Stdout,
            codec: Codec::Auto,
            options: AlignOptions::default(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            stats_path: None,
        }
    }

    pub fn with_indices(mut self, path: impl Into<PathBuf>) -> Self {
        self.indices = InputSource::File(path.into());
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = OutputSink::File(path.into());
        self
    }
}

impl From<JoinArgs> for JoinConfig {
    fn from(args: JoinArgs) -> Self {
        Self {
            indices: if is_dash(&args.indices) {
                InputSource::Stdin
            } else {
                InputSource::File(args.indices)
            },
            columns1: args.columns1,
            columns2: args.columns2,
            output: if is_dash(&args.output) {
                OutputSink::Stdout
            } else {
                OutputSink::File(args.output)
            },
            codec: args.codec,
            options: AlignOptions {
                max_lookahead: args.max_lookahead,
                lookahead_warn: args.lookahead_warn,
            },
            progress_every: args.progress_every,
            stats_path: args.stats,
        }
    }
}
