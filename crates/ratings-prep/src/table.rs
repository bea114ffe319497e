//! Delimited-file reading with header-based column lookup.
//!
//! Tables are read fully into memory and the file handle is closed before
//! the caller sees the result. Columns are resolved by header name; columns
//! nobody asks for are carried but ignored.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::error::{PrepError, Result};
use crate::model::Interaction;

/// An in-memory delimited table with a header row.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    /// Read the whole file at `path`. The first row is the header.
    ///
    /// Rows shorter than the header are kept and their missing trailing
    /// fields read as empty; rows longer than the header are rejected.
    pub fn read(path: &Path, delimiter: u8) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|source| PrepError::MissingInputFile {
                path: path.to_path_buf(),
                source,
            })?;
        let malformed = |source: csv::Error| PrepError::MalformedCsv {
            path: path.to_path_buf(),
            source,
        };
        let headers = rdr.headers().map_err(malformed)?.clone();
        let mut rows = Vec::new();
        for (i, rec) in rdr.records().enumerate() {
            let rec = rec.map_err(malformed)?;
            if rec.len() > headers.len() {
                return Err(PrepError::TooManyFields {
                    path: path.to_path_buf(),
                    row: i + 1,
                    expected: headers.len(),
                    found: rec.len(),
                });
            }
            rows.push(rec);
        }
        tracing::debug!(
            "read {} row(s) x {} column(s) from {}",
            rows.len(),
            headers.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| PrepError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            })
    }

    /// Values of `column` in row order.
    pub fn column(&self, column: &str) -> Result<impl Iterator<Item = &str>> {
        let idx = self.column_index(column)?;
        // Short rows have no trailing fields; those read as empty.
        Ok(self.rows.iter().map(move |r| r.get(idx).unwrap_or("")))
    }

    /// Project the interaction columns out of this table.
    pub fn interactions(&self) -> Result<Vec<Interaction>> {
        let user = self.column_index("user_id")?;
        let product = self.column_index("product_id")?;
        let rating = self.column_index("rating")?;
        Ok(self
            .rows
            .iter()
            .map(|r| Interaction {
                user_id: r.get(user).unwrap_or("").to_string(),
                product_id: r.get(product).unwrap_or("").to_string(),
                rating: r.get(rating).unwrap_or("").to_string(),
            })
            .collect())
    }
}
