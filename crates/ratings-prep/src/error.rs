//! Error types for the ratings preparation pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions raised while loading, remapping, or exporting tables.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Input file absent or unreadable.
    #[error("cannot read input file {}: {source}", path.display())]
    MissingInputFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is not present in the header row.
    #[error("column '{column}' not found in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// The reader rejected a record (invalid UTF-8, I/O failure mid-read).
    #[error("malformed record in {}: {source}", path.display())]
    MalformedCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A data row has more fields than the header.
    #[error("row {row} of {} has {found} field(s), header has {expected}", path.display())]
    TooManyFields {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An interaction references an identifier absent from its reference table.
    /// Only raised under the `fail` policy.
    #[error("interaction row {row}: {column} '{value}' is not in the reference table")]
    UnmappedIdentifier {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// Output directory or one of the output files cannot be created or written.
    #[error("cannot write output at {}: {source}", path.display())]
    OutputDirectoryUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PrepError>;
