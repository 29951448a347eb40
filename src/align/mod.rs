//! Single-pass document join
//!
//! Joins aligned document pairs `(doc1, doc2)` with per-document column files
//! for both sides. Every column file is read strictly forward, exactly once.
//!
//! ## Strategy
//!
//! 1. **Ingest Pairs**: Load every `(doc1, doc2)` pair and count how many
//!    times each `doc2` is needed
//! 2. **Advance Side A**: Pairs are sorted by `doc1`, so side A only ever moves
//!    forward and keeps its current row
//! 3. **Resolve Side B**: `doc2` is not sorted. Rows read past the current
//!    target that a later pair still needs go into a lookahead buffer, keyed by
//!    line number, and stay there until their last use
//! 4. **Emit**: One tab-separated record per pair, in pair order
//!
//! ## Memory Usage
//!
//! The pair list and the per-`doc2` use counts are held in memory. Column data
//! is streamed; only buffered side-B rows are kept, and their number is bounded
//! by how far out of order the `doc2` sequence is.

pub mod join;
pub mod pairs;
pub mod rows;
pub mod state;

pub use join::{write_record, AlignStats, Aligner};
pub use pairs::{read_pairs, IndexPair, PairList};
pub use rows::{ColumnReader, Row, RowReader};
pub use state::{AlignOptions, AlignerState, SideA, SideB};
