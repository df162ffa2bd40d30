//! Append-only CSV output.
//!
//! The writer never reads existing content. It writes the header only when
//! the target is new or empty, and flushes after every row so a crash loses
//! at most the row in flight.
//!
//! Records end in `\r\n`, the conventional CSV record terminator.

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use groomer_core::{OUTPUT_HEADER, OutputRow};
use groomer_fs::open_append;
use thiserror::Error;

/// Column delimiter.
pub const DELIMITER: char = ',';

/// Record terminator.
pub const TERMINATOR: &str = "\r\n";

/// Errors raised while persisting rows.
#[derive(Debug, Error)]
pub enum WriterError {
    /// The output file could not be created or opened.
    #[error("failed to open output file {path}")]
    Open {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A row or the header could not be written and flushed.
    #[error("failed to write to output file {path}")]
    Write {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Destination for normalized rows.
pub trait RowSink {
    /// Persist one row.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError`] when the row cannot be stored.
    fn write_row(&mut self, row: &OutputRow) -> Result<(), WriterError>;
}

impl<W: RowSink + ?Sized> RowSink for &mut W {
    fn write_row(&mut self, row: &OutputRow) -> Result<(), WriterError> {
        (**self).write_row(row)
    }
}

/// Exclusive append handle on the output file for one run.
#[derive(Debug)]
pub struct IncrementalWriter {
    file: fs_utf8::File,
    path: Utf8PathBuf,
    rows_written: u64,
}

impl IncrementalWriter {
    /// Open `path` for appending, creating it and writing the header if it is
    /// new or empty.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Open`] when the file or its parent directory
    /// cannot be created, and [`WriterError::Write`] when the header cannot be
    /// written.
    pub fn open(path: &Utf8Path) -> Result<Self, WriterError> {
        let target = open_append(path).map_err(|source| WriterError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = Self {
            file: target.file,
            path: path.to_path_buf(),
            rows_written: 0,
        };
        if target.was_empty {
            writer.append_line(&encode_record(OUTPUT_HEADER))?;
        }
        Ok(writer)
    }

    /// Append `row` and flush it.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Write`] on any I/O failure.
    pub fn write(&mut self, row: &OutputRow) -> Result<(), WriterError> {
        self.append_line(&encode_record(row.to_record()))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush and release the file handle.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Write`] if the final flush fails.
    pub fn close(mut self) -> Result<(), WriterError> {
        self.file.flush().map_err(|source| WriterError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Output path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Rows appended through this handle.
    #[must_use]
    pub const fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn append_line(&mut self, line: &str) -> Result<(), WriterError> {
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|source| WriterError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

impl RowSink for IncrementalWriter {
    fn write_row(&mut self, row: &OutputRow) -> Result<(), WriterError> {
        self.write(row)
    }
}

/// Join `cells` into one delimited line ending in [`TERMINATOR`].
///
/// # Examples
/// ```
/// use groomer_data::writer::encode_record;
///
/// assert_eq!(encode_record(["a", "b,c", "say \"hi\""]), "a,\"b,c\",\"say \"\"hi\"\"\"\r\n");
/// ```
pub fn encode_record<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        push_cell(&mut line, cell.as_ref());
    }
    line.push_str(TERMINATOR);
    line
}

fn push_cell(line: &mut String, cell: &str) {
    let needs_quotes = cell.contains([DELIMITER, '"', '\n', '\r']);
    if needs_quotes {
        line.push('"');
        line.push_str(&cell.replace('"', "\"\""));
        line.push('"');
    } else {
        line.push_str(cell);
    }
}
