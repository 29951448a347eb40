//! Step 1: Ingest index pairs
//!
//! Input lines are `doc1<TAB>doc2[<TAB>...]`; extra fields (aligner scores and
//! the like) are ignored. Pairs must be sorted by `doc1`.

use std::io::BufRead;

use rustc_hash::FxHashMap;

use crate::error::{AlignError, Result};

/// One aligned document pair, both indices 1-based line numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexPair {
    pub doc1: u64,
    pub doc2: u64,
}

impl IndexPair {
    pub fn new(doc1: u64, doc2: u64) -> Self {
        Self { doc1, doc2 }
    }
}

/// All pairs in arrival order plus the number of uses of every `doc2`
#[derive(Debug, Clone, Default)]
pub struct PairList {
    pairs: Vec<IndexPair>,
    targets: FxHashMap<u64, usize>,
}

impl PairList {
    /// Build from already-parsed pairs, checking the `doc1` ordering
    pub fn from_pairs(pairs: impl IntoIterator<Item = IndexPair>) -> Result<Self> {
        let mut list = Self::default();
        for (i, pair) in pairs.into_iter().enumerate() {
            list.push(pair, i as u64 + 1)?;
        }
        Ok(list)
    }

    fn push(&mut self, pair: IndexPair, line: u64) -> Result<()> {
        if let Some(last) = self.pairs.last() {
            if pair.doc1 < last.doc1 {
                return Err(AlignError::UnsortedPairs {
                    line,
                    doc1: pair.doc1,
                    previous: last.doc1,
                });
            }
        }
        *self.targets.entry(pair.doc2).or_insert(0) += 1;
        self.pairs.push(pair);
        Ok(())
    }

    pub fn pairs(&self) -> &[IndexPair] {
        &self.pairs
    }

    /// Remaining uses per `doc2`, before any pair is processed
    pub fn targets(&self) -> &FxHashMap<u64, usize> {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn into_parts(self) -> (Vec<IndexPair>, FxHashMap<u64, usize>) {
        (self.pairs, self.targets)
    }
}

/// Read the whole index stream
///
/// Any unparsable line aborts ingestion: a misparsed index would shift every
/// record after it.
pub fn read_pairs<R: BufRead>(mut reader: R, label: &str) -> Result<PairList> {
    let mut list = PairList::default();
    let mut line = Vec::new();
    let mut line_no = 0u64;

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|io| AlignError::Read {
                column: label.to_string(),
                line: line_no + 1,
                io,
            })?;
        if n == 0 {
            break;
        }
        line_no += 1;

        let text = std::str::from_utf8(&line).map_err(|e| AlignError::MalformedRecord {
            line: line_no,
            reason: format!("invalid UTF-8 at byte {}", e.valid_up_to()),
        })?;
        if text.trim().is_empty() {
            continue;
        }
        let pair = parse_pair(text, line_no)?;
        list.push(pair, line_no)?;
    }

    Ok(list)
}

fn parse_pair(line: &str, line_no: u64) -> Result<IndexPair> {
    let mut fields = line.split('\t');
    let doc1 = parse_index(fields.next(), "first", line_no)?;
    let doc2 = parse_index(fields.next(), "second", line_no)?;
    Ok(IndexPair { doc1, doc2 })
}

fn parse_index(field: Option<&str>, which: &str, line_no: u64) -> Result<u64> {
    let malformed = |reason: String| AlignError::MalformedRecord {
        line: line_no,
        reason,
    };

    let field = field
        .map(str::trim)
        .ok_or_else(|| malformed(format!("missing {} index field", which)))?;
    let value: u64 = field
        .parse()
        .map_err(|_| malformed(format!("{} index {:?} is not an integer", which, field)))?;
    if value == 0 {
        return Err(malformed(format!("{} index is 0; indices are 1-based", which)));
    }
    Ok(value)
}
