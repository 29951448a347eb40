//! docjoin - single-pass join of aligned document pairs with column files
//!
//! An external aligner produces `(doc1, doc2)` pairs of line numbers, sorted by
//! `doc1`. Each side has one or more column files where line N describes
//! document N (URL, text, ...). This crate emits one record per pair carrying
//! both documents' columns, reading every column file forward exactly once.

pub mod align;
pub mod config;
pub mod error;
pub mod logging;
pub mod source;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

pub use align::{AlignOptions, AlignStats, IndexPair, PairList};
pub use config::{InputSource, JoinArgs, JoinConfig, OutputSink};
pub use error::{AlignError, Result, Side};
pub use source::{Codec, TextSource};

use align::{read_pairs, Aligner, AlignerState, ColumnReader, RowReader};

const WRITE_BUFFER: usize = 4 * 1024 * 1024;

/// Run a complete join as configured
///
/// All sources are owned by this call and released when it returns, on
/// success and on every error path.
pub fn run(config: &JoinConfig) -> Result<AlignStats> {
    let start_time = Instant::now();

    let pairs = {
        let source = match &config.indices {
            InputSource::Stdin => TextSource::stdin(),
            InputSource::File(path) => TextSource::open(path, config.codec)?,
        };
        let label = source.label().to_string();
        read_pairs(source, &label)?
    };
    info!(
        pairs = pairs.len(),
        distinct_doc2 = pairs.targets().len(),
        "loaded index pairs"
    );

    let rows_a = open_side(Side::A, &config.columns1, config.codec)?;
    let rows_b = open_side(Side::B, &config.columns2, config.codec)?;
    let (pairs, pending) = pairs.into_parts();
    let state = AlignerState::new(rows_a, rows_b, pending, config.options);

    let mut out: BufWriter<Box<dyn Write>> = match &config.output {
        OutputSink::Stdout => BufWriter::with_capacity(WRITE_BUFFER, Box::new(io::stdout().lock())),
        OutputSink::File(path) => {
            let file = File::create(path).map_err(|io| AlignError::Open {
                path: path.clone(),
                io,
            })?;
            BufWriter::with_capacity(WRITE_BUFFER, Box::new(file))
        }
    };

    let stats = Aligner::new(state, config.progress_every).run(&pairs, &mut out)?;

    info!(
        pairs = stats.pairs,
        side_a_lines = stats.side_a_lines_read,
        side_b_lines = stats.side_b_lines_read,
        peak_buffered = stats.peak_buffered,
        buffered_hits = stats.buffered_hits,
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "join complete"
    );

    if let Some(path) = &config.stats_path {
        write_stats(path, &stats)?;
    }
    Ok(stats)
}

fn open_side(side: Side, paths: &[PathBuf], codec: Codec) -> Result<RowReader<TextSource>> {
    let columns = paths
        .iter()
        .map(|path| -> Result<ColumnReader<TextSource>> {
            let source = TextSource::open(path, codec)?;
            Ok(ColumnReader::new(source.label().to_string(), source))
        })
        .collect::<Result<Vec<_>>>()?;
    RowReader::new(side, columns)
}

fn write_stats(path: &Path, stats: &AlignStats) -> Result<()> {
    let file = File::create(path).map_err(|io| AlignError::Open {
        path: path.to_path_buf(),
        io,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, stats)?;
    writer.flush().map_err(|e| AlignError::Stats(serde_json::Error::io(e)))
}
