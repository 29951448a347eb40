//! Step 4: Join pairs with both sides and emit records
//!
//! Output, one line per pair and in pair order:
//! `doc1<TAB>cols1...<TAB>doc2<TAB>cols2...`

use std::io::{self, BufRead, Write};
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use super::pairs::IndexPair;
use super::state::AlignerState;
use crate::error::{AlignError, Result};

/// Counters for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignStats {
    /// Records written, one per pair
    pub pairs: u64,
    pub side_a_lines_read: u64,
    pub side_b_lines_read: u64,
    /// Largest number of side-B rows buffered at once
    pub peak_buffered: usize,
    /// Side-B lookups answered from the buffer
    pub buffered_hits: u64,
    /// Rows still buffered at the end (0 for a consistent pair list)
    pub leftover_buffered: usize,
}

/// Drives the join over a pair list
pub struct Aligner<A, B> {
    state: AlignerState<A, B>,
    progress_every: u64,
}

impl<A: BufRead, B: BufRead> Aligner<A, B> {
    /// `progress_every` pairs between progress lines; 0 disables them
    pub fn new(state: AlignerState<A, B>, progress_every: u64) -> Self {
        Self {
            state,
            progress_every,
        }
    }

    pub fn state(&self) -> &AlignerState<A, B> {
        &self.state
    }

    /// Join every pair and write its record to `out`
    pub fn run<W: Write>(&mut self, pairs: &[IndexPair], out: &mut W) -> Result<AlignStats> {
        let start_time = Instant::now();
        let AlignerState { side_a, side_b } = &mut self.state;
        let mut written = 0u64;

        for pair in pairs {
            let data1 = side_a.advance_to(pair.doc1)?;
            let data2 = side_b.resolve(pair.doc2)?;
            write_record(out, pair.doc1, data1, pair.doc2, &data2).map_err(AlignError::Write)?;
            written += 1;

            if self.progress_every > 0 && written % self.progress_every == 0 {
                let elapsed = start_time.elapsed().as_secs_f64();
                info!(
                    pairs = written,
                    total = pairs.len(),
                    side_b_cursor = side_b.rows().lines_read(),
                    buffered = side_b.buffered(),
                    pairs_per_sec = (written as f64 / elapsed.max(0.001)) as u64,
                    "join progress"
                );
            }
        }
        out.flush().map_err(AlignError::Write)?;

        Ok(AlignStats {
            pairs: written,
            side_a_lines_read: side_a.rows().lines_read(),
            side_b_lines_read: side_b.rows().lines_read(),
            peak_buffered: side_b.peak_buffered(),
            buffered_hits: side_b.buffered_hits(),
            leftover_buffered: side_b.buffered(),
        })
    }
}

/// Write one joined record; column values are copied byte for byte
pub fn write_record<W: Write>(
    out: &mut W,
    doc1: u64,
    data1: &[Vec<u8>],
    doc2: u64,
    data2: &[Vec<u8>],
) -> io::Result<()> {
    write!(out, "{}", doc1)?;
    for value in data1 {
        out.write_all(b"\t")?;
        out.write_all(value)?;
    }
    write!(out, "\t{}", doc2)?;
    for value in data2 {
        out.write_all(b"\t")?;
        out.write_all(value)?;
    }
    out.write_all(b"\n")
}
