//! Steps 2 and 3: advance side A, resolve side B
//!
//! Side A follows the sorted `doc1` sequence and never looks back. Side B has
//! to serve `doc2` values in any order from files it can only read forward, so
//! it keeps rows that later pairs still need in a lookahead buffer.
//!
//! Buffer entries are reference counted through `pending`: a row stays
//! buffered until the last pair that needs it has been served, which covers
//! `doc2` values repeated any number of times, adjacent or not.

use std::io::BufRead;

use rustc_hash::FxHashMap;
use tracing::warn;

use super::rows::{Row, RowReader};
use crate::error::{AlignError, Result};

/// Default high-water mark for the first lookahead warning
pub const DEFAULT_LOOKAHEAD_WARN: usize = 100_000;

/// Limits and diagnostics for the side-B lookahead buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignOptions {
    /// Fail with [`AlignError::LookaheadOverflow`] instead of buffering more rows
    pub max_lookahead: Option<usize>,
    /// Warn when the buffer first holds this many rows, then at every doubling.
    /// 0 disables the warning.
    pub lookahead_warn: usize,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            max_lookahead: None,
            lookahead_warn: DEFAULT_LOOKAHEAD_WARN,
        }
    }
}

/// Side A: a row cursor that only moves forward to the requested `doc1`
pub struct SideA<R> {
    rows: RowReader<R>,
    current: Row,
}

impl<R: BufRead> SideA<R> {
    pub fn new(rows: RowReader<R>) -> Self {
        Self {
            rows,
            current: Vec::new(),
        }
    }

    /// Row for document `target`, reading forward as needed
    ///
    /// Asking for the current document again reuses its row; asking for an
    /// earlier one is an ordering bug upstream.
    pub fn advance_to(&mut self, target: u64) -> Result<&[Vec<u8>]> {
        let cursor = self.rows.lines_read();
        if target == 0 || target < cursor {
            return Err(AlignError::OutOfOrder { target, cursor });
        }
        while self.rows.lines_read() < target {
            self.current = self.rows.read_row(target)?;
        }
        Ok(&self.current)
    }

    pub fn rows(&self) -> &RowReader<R> {
        &self.rows
    }
}

/// Side B: a forward-only row cursor plus the lookahead buffer
pub struct SideB<R> {
    rows: RowReader<R>,
    /// `doc2` -> uses not yet served
    pending: FxHashMap<u64, usize>,
    /// Line number -> row, for rows some unserved pair still needs
    buffer: FxHashMap<u64, Row>,
    options: AlignOptions,
    next_warn: usize,
    peak_buffered: usize,
    buffered_hits: u64,
}

impl<R: BufRead> SideB<R> {
    /// `pending` holds the number of pairs referencing each `doc2`
    pub fn new(
        rows: RowReader<R>,
        pending: FxHashMap<u64, usize>,
        options: AlignOptions,
    ) -> Self {
        Self {
            rows,
            pending,
            buffer: FxHashMap::default(),
            options,
            next_warn: options.lookahead_warn,
            peak_buffered: 0,
            buffered_hits: 0,
        }
    }

    /// Row for document `target`
    ///
    /// Served from the buffer when an earlier scan already passed it,
    /// otherwise read forward, buffering every pending row on the way.
    pub fn resolve(&mut self, target: u64) -> Result<Row> {
        let remaining = self.release(target);

        if self.buffer.contains_key(&target) {
            self.buffered_hits += 1;
            let row = if remaining == 0 {
                self.buffer.remove(&target)
            } else {
                self.buffer.get(&target).cloned()
            };
            if let Some(row) = row {
                return Ok(row);
            }
        }

        let cursor = self.rows.lines_read();
        if target <= cursor {
            return Err(AlignError::LookaheadMiss { target, cursor });
        }

        loop {
            let row = self.rows.read_row(target)?;
            let line = self.rows.lines_read();

            if line == target {
                if remaining > 0 {
                    self.stash(line, row.clone(), target)?;
                }
                return Ok(row);
            }
            if self.pending.contains_key(&line) {
                self.stash(line, row, target)?;
            }
        }
    }

    /// Count one use of `target`; returns the uses left after this one
    fn release(&mut self, target: u64) -> usize {
        match self.pending.get_mut(&target) {
            Some(uses) if *uses > 1 => {
                *uses -= 1;
                *uses
            }
            Some(_) => {
                self.pending.remove(&target);
                0
            }
            None => 0,
        }
    }

    fn stash(&mut self, line: u64, row: Row, target: u64) -> Result<()> {
        if let Some(limit) = self.options.max_lookahead {
            if self.buffer.len() >= limit {
                return Err(AlignError::LookaheadOverflow { limit, target });
            }
        }
        self.buffer.insert(line, row);

        let buffered = self.buffer.len();
        if buffered > self.peak_buffered {
            self.peak_buffered = buffered;
            if self.next_warn > 0 && buffered >= self.next_warn {
                warn!(
                    buffered,
                    cursor = line,
                    seeking = target,
                    pending = self.pending.len(),
                    "side B lookahead buffer is growing; doc2 order is far from sorted"
                );
                self.next_warn = self.next_warn.saturating_mul(2);
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> &RowReader<R> {
        &self.rows
    }

    /// Rows currently held for later pairs
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Distinct `doc2` values some unserved pair still needs
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn peak_buffered(&self) -> usize {
        self.peak_buffered
    }

    /// Resolutions answered from the buffer without reading
    pub fn buffered_hits(&self) -> u64 {
        self.buffered_hits
    }
}

/// Both sides of the join, owned together for the whole run
pub struct AlignerState<A, B> {
    pub side_a: SideA<A>,
    pub side_b: SideB<B>,
}

impl<A: BufRead, B: BufRead> AlignerState<A, B> {
    pub fn new(
        rows_a: RowReader<A>,
        rows_b: RowReader<B>,
        pending: FxHashMap<u64, usize>,
        options: AlignOptions,
    ) -> Self {
        Self {
            side_a: SideA::new(rows_a),
            side_b: SideB::new(rows_b, pending, options),
        }
    }
}
