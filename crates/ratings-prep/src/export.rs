//! Write the remapped ratings and both identifier maps.
//!
//! Output layout (comma-separated, UTF-8, header row):
//! - `ratings.csv`: `user_idx,product_idx,rating`, one row per kept interaction
//! - `user_map.csv`: `,user_idx` (unlabeled first column holds the original id)
//! - `product_map.csv`: `,product_idx`

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::error::{PrepError, Result};
use crate::model::{IdentifierMap, RemappedInteraction};

pub const RATINGS_FILE: &str = "ratings.csv";
pub const USER_MAP_FILE: &str = "user_map.csv";
pub const PRODUCT_MAP_FILE: &str = "product_map.csv";

/// Paths of the files written by [`export`].
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub ratings: PathBuf,
    pub user_map: PathBuf,
    pub product_map: PathBuf,
}

pub fn export(
    rows: &[RemappedInteraction],
    users: &IdentifierMap,
    products: &IdentifierMap,
    output_dir: &Path,
) -> Result<ExportPaths> {
    fs::create_dir_all(output_dir).map_err(|source| PrepError::OutputDirectoryUnwritable {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let paths = ExportPaths {
        ratings: output_dir.join(RATINGS_FILE),
        user_map: output_dir.join(USER_MAP_FILE),
        product_map: output_dir.join(PRODUCT_MAP_FILE),
    };

    write_ratings(&paths.ratings, rows).map_err(|e| unwritable(&paths.ratings, e))?;
    write_map(&paths.user_map, "user_idx", users).map_err(|e| unwritable(&paths.user_map, e))?;
    write_map(&paths.product_map, "product_idx", products)
        .map_err(|e| unwritable(&paths.product_map, e))?;

    tracing::debug!(
        "wrote {} rating row(s), {} user(s), {} product(s) to {}",
        rows.len(),
        users.len(),
        products.len(),
        output_dir.display()
    );
    Ok(paths)
}

fn unwritable(path: &Path, e: csv::Error) -> PrepError {
    PrepError::OutputDirectoryUnwritable {
        path: path.to_path_buf(),
        source: e.into(),
    }
}

fn idx_field(idx: Option<usize>) -> String {
    idx.map(|i| i.to_string()).unwrap_or_default()
}

fn write_ratings(path: &Path, rows: &[RemappedInteraction]) -> csv::Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["user_idx", "product_idx", "rating"])?;
    for r in rows {
        wtr.write_record([
            idx_field(r.user_idx).as_str(),
            idx_field(r.product_idx).as_str(),
            r.rating.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_map(path: &Path, idx_header: &str, map: &IdentifierMap) -> csv::Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["", idx_header])?;
    for (id, idx) in map.iter() {
        wtr.write_record([id, idx.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}
