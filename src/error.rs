//! Error taxonomy for the document join
//!
//! Every variant is fatal for the run: a one-pass merge cannot re-read a
//! stream, so nothing here is retried or recovered locally.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Which side of an index pair a column belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// First document of the pair (`doc1`)
    A,
    /// Second document of the pair (`doc2`)
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("side A"),
            Side::B => f.write_str("side B"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// An index line did not yield two positive integers
    #[error("malformed index record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// `doc1` went backwards in the index stream
    #[error("index pairs are not sorted by first document: line {line} has {doc1} after {previous}")]
    UnsortedPairs { line: u64, doc1: u64, previous: u64 },

    /// A column file ran out before the required document was reached
    #[error("{side} column {column} ended after {lines_read} lines, but document {needed} is required")]
    TruncatedInput {
        side: Side,
        column: String,
        lines_read: u64,
        needed: u64,
    },

    /// A side-B target was passed without being buffered
    #[error("side B document {target} was already passed (cursor at line {cursor}) and is not buffered")]
    LookaheadMiss { target: u64, cursor: u64 },

    /// Side A was asked to move backwards
    #[error("side A cannot rewind to document {target}: already at line {cursor}")]
    OutOfOrder { target: u64, cursor: u64 },

    /// The lookahead buffer hit its configured cap
    #[error("lookahead buffer reached its limit of {limit} rows while seeking side B document {target}")]
    LookaheadOverflow { limit: usize, target: u64 },

    #[error("{side} has no column files")]
    NoColumns { side: Side },

    #[error("decompressor `{program}` not found in PATH")]
    MissingDecompressor { program: &'static str },

    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        io: io::Error,
    },

    #[error("failed to read {column} at line {line}")]
    Read {
        column: String,
        line: u64,
        #[source]
        io: io::Error,
    },

    #[error("failed to write joined records")]
    Write(#[source] io::Error),

    #[error("failed to write run statistics")]
    Stats(#[from] serde_json::Error),
}

pub type Result<T, E = AlignError> = std::result::Result<T, E>;
