//! Dataset loading from a comma-delimited file.
//!
//! # Responsibilities
//! - Read the dataset file once at startup
//! - Split each line into fields (double quotes and `""` escapes supported)
//! - Map the fields positionally onto [`Record`]
//!
//! # Design Decisions
//! - Any unreadable file or malformed row fails the whole load; the service
//!   has nothing to serve without the full dataset
//! - Empty lines are skipped and `\r\n` is read as `\n`
//! - Quoted fields may span lines; a quote inside an unquoted field is an error

use std::fs;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use thiserror::Error;

use crate::store::record::{Record, RECORD_COLUMNS};

/// Errors raised while loading the dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A row had the wrong number of columns.
    #[error("line {line}: expected {} columns, found {found}", RECORD_COLUMNS)]
    Malformed { line: usize, found: usize },

    /// A quoted field was never closed, text followed a closing quote, or a
    /// quote appeared inside an unquoted field.
    #[error("line {line}: bad quoting")]
    Quoting { line: usize },
}

/// Options controlling how the file is interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Skip the first row.
    pub has_header: bool,
}

/// Load every record from the file at `path`.
pub fn load_records(path: &Path, options: LoadOptions) -> Result<Vec<Record>, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_records(&content, options)
}

/// Parse records out of already-read file contents.
pub fn parse_records(content: &str, options: LoadOptions) -> Result<Vec<Record>, LoadError> {
    let content = content.replace("\r\n", "\n");
    let mut rows = Rows::new(&content);
    let mut records = Vec::new();

    if options.has_header {
        rows.next().transpose()?;
    }

    for row in rows {
        let (line, columns) = row?;
        let found = columns.len();
        let record = Record::from_columns(columns).ok_or(LoadError::Malformed { line, found })?;
        records.push(record);
    }

    Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// Nothing read yet for this field.
    Start,
    Unquoted,
    Quoted,
    /// The closing quote was seen; only a delimiter may follow.
    Closed,
}

/// Iterates over rows as `(first line number, fields)`.
///
/// Quoted fields may span lines. Empty lines between rows are skipped.
struct Rows<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Rows<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            chars: content.chars().peekable(),
            line: 1,
        }
    }

    fn read_row(&mut self) -> Result<(usize, Vec<String>), LoadError> {
        let start = self.line;
        let mut fields = Vec::with_capacity(RECORD_COLUMNS);
        let mut field = String::new();
        let mut state = FieldState::Start;

        loop {
            let next = self.chars.next();
            if next == Some('\n') {
                self.line += 1;
            }

            if state == FieldState::Quoted {
                match next {
                    None => return Err(LoadError::Quoting { line: start }),
                    Some('"') if self.chars.peek() == Some(&'"') => {
                        self.chars.next();
                        field.push('"');
                    }
                    Some('"') => state = FieldState::Closed,
                    Some(c) => field.push(c),
                }
                continue;
            }

            match next {
                None | Some('\n') => {
                    fields.push(field);
                    return Ok((start, fields));
                }
                Some(',') => {
                    fields.push(std::mem::take(&mut field));
                    state = FieldState::Start;
                }
                Some('"') if state == FieldState::Start => state = FieldState::Quoted,
                // Text after a closing quote, or a bare quote inside an unquoted field.
                Some(_) if state == FieldState::Closed => return Err(LoadError::Quoting { line: self.line }),
                Some('"') => return Err(LoadError::Quoting { line: self.line }),
                Some(c) => {
                    field.push(c);
                    state = FieldState::Unquoted;
                }
            }
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<(usize, Vec<String>), LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.chars.peek() == Some(&'\n') {
            self.chars.next();
            self.line += 1;
        }
        self.chars.peek()?;
        Some(self.read_row())
    }
}
