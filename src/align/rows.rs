//! Column readers and lock-step rows
//!
//! A side owns N column files that describe the same documents. They are only
//! ever advanced together through [`RowReader::read_row`], so all columns of a
//! side always sit on the same line.

use std::io::{self, BufRead};

use crate::error::{AlignError, Result, Side};

/// One row of column values, raw bytes as found in the files
///
/// Values are never decoded: document text may be in any encoding.
pub type Row = Vec<Vec<u8>>;

/// Forward-only cursor over the lines of one column file
pub struct ColumnReader<R> {
    label: String,
    reader: R,
    lines_read: u64,
    line: Vec<u8>,
}

impl<R: BufRead> ColumnReader<R> {
    pub fn new(label: impl Into<String>, reader: R) -> Self {
        Self {
            label: label.into(),
            reader,
            lines_read: 0,
            line: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lines consumed so far; the last value returned was this line number
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Next value with surrounding ASCII whitespace removed, `None` at end of stream
    pub fn next_value(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.line.clear();
        if self.reader.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(None);
        }
        self.lines_read += 1;
        Ok(Some(self.line.trim_ascii().to_vec()))
    }
}

/// All column readers of one side, advanced one row at a time
pub struct RowReader<R> {
    side: Side,
    columns: Vec<ColumnReader<R>>,
    lines_read: u64,
}

impl<R: BufRead> RowReader<R> {
    pub fn new(side: Side, columns: Vec<ColumnReader<R>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(AlignError::NoColumns { side });
        }
        Ok(Self {
            side,
            columns,
            lines_read: 0,
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of columns in every row
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Shared cursor: rows read so far
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Lines consumed by each column file
    pub fn column_lines_read(&self) -> Vec<u64> {
        self.columns.iter().map(ColumnReader::lines_read).collect()
    }

    /// Read the next row from every column
    ///
    /// `needed` is the document the caller is seeking, reported if a column
    /// file runs out first.
    pub fn read_row(&mut self, needed: u64) -> Result<Row> {
        let mut row = Vec::with_capacity(self.columns.len());
        for column in &mut self.columns {
            let value = column.next_value().map_err(|io| AlignError::Read {
                column: column.label.clone(),
                line: column.lines_read + 1,
                io,
            })?;
            match value {
                Some(value) => row.push(value),
                None => {
                    return Err(AlignError::TruncatedInput {
                        side: self.side,
                        column: column.label.clone(),
                        lines_read: column.lines_read,
                        needed,
                    })
                }
            }
        }
        self.lines_read += 1;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(row: Row) -> Vec<String> {
        row.into_iter()
            .map(|value| String::from_utf8_lossy(&value).into_owned())
            .collect()
    }

    fn rows(side: Side, columns: &[&'static str]) -> RowReader<&'static [u8]> {
        let columns = columns
            .iter()
            .copied()
            .enumerate()
            .map(|(i, data)| ColumnReader::new(format!("col{}", i + 1), data.as_bytes()))
            .collect();
        RowReader::new(side, columns).unwrap()
    }

    #[test]
    fn test_columns_advance_together() {
        let mut reader = rows(Side::A, &["u1\nu2\n", "t1\nt2\n"]);
        assert_eq!(reader.width(), 2);
        assert_eq!(text(reader.read_row(1).unwrap()), vec!["u1", "t1"]);
        assert_eq!(text(reader.read_row(2).unwrap()), vec!["u2", "t2"]);
        assert_eq!(reader.lines_read(), 2);
        assert_eq!(reader.column_lines_read(), vec![2, 2]);
    }

    #[test]
    fn test_values_are_trimmed() {
        let mut reader = rows(Side::B, &["  padded value \r\n"]);
        assert_eq!(text(reader.read_row(1).unwrap()), vec!["padded value"]);
    }

    #[test]
    fn test_empty_lines_are_values() {
        let mut reader = rows(Side::B, &["\nx\n"]);
        assert_eq!(text(reader.read_row(1).unwrap()), vec![""]);
        assert_eq!(text(reader.read_row(2).unwrap()), vec!["x"]);
    }

    #[test]
    fn test_non_utf8_values_pass_through() {
        let data: &'static [u8] = b"caf\xe9 latin-1\n\xff\xfe raw\n";
        let mut reader = RowReader::new(Side::B, vec![ColumnReader::new("col1", data)]).unwrap();
        assert_eq!(reader.read_row(1).unwrap(), vec![b"caf\xe9 latin-1".to_vec()]);
        assert_eq!(reader.read_row(2).unwrap(), vec![b"\xff\xfe raw".to_vec()]);
    }

    #[test]
    fn test_short_column_is_truncation() {
        let mut reader = rows(Side::A, &["a1\na2\n", "b1\n"]);
        reader.read_row(1).unwrap();
        match reader.read_row(2).unwrap_err() {
            AlignError::TruncatedInput {
                side,
                column,
                lines_read,
                needed,
            } => {
                assert_eq!(side, Side::A);
                assert_eq!(column, "col2");
                assert_eq!(lines_read, 1);
                assert_eq!(needed, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(reader.lines_read(), 1);
    }

    #[test]
    fn test_no_columns_rejected() {
        let result = RowReader::<&[u8]>::new(Side::B, Vec::new());
        assert!(matches!(result, Err(AlignError::NoColumns { side: Side::B })));
    }
}
