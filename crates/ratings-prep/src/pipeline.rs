//! Straight-line preparation run: load → build maps → apply → export.

use std::path::PathBuf;

use crate::error::Result;
use crate::export::{ExportPaths, export};
use crate::remap::{UnmappedPolicy, apply_maps, build_identifier_map};
use crate::table::Table;

pub const USERS_FILE: &str = "users.csv";
pub const PRODUCTS_FILE: &str = "products.csv";
pub const INTERACTIONS_FILE: &str = "interactions.csv";

/// Resolved inputs for one run.
#[derive(Debug, Clone)]
pub struct PrepSettings {
    /// Directory holding `users.csv`, `products.csv`, `interactions.csv`.
    pub data_dir: PathBuf,
    /// Directory receiving `ratings.csv`, `user_map.csv`, `product_map.csv`.
    pub output_dir: PathBuf,
    /// Input field delimiter.
    pub delimiter: u8,
    pub unmapped: UnmappedPolicy,
}

/// Counts and paths describing a finished run.
#[derive(Debug, Clone)]
pub struct PrepSummary {
    pub users: usize,
    pub products: usize,
    pub interactions: usize,
    pub ratings_written: usize,
    pub unmapped_users: usize,
    pub unmapped_products: usize,
    pub dropped: usize,
    pub outputs: ExportPaths,
}

pub fn run(settings: &PrepSettings) -> Result<PrepSummary> {
    // All inputs are loaded before anything is written.
    let users_tbl = Table::read(&settings.data_dir.join(USERS_FILE), settings.delimiter)?;
    let products_tbl = Table::read(&settings.data_dir.join(PRODUCTS_FILE), settings.delimiter)?;
    let interactions_tbl =
        Table::read(&settings.data_dir.join(INTERACTIONS_FILE), settings.delimiter)?;
    tracing::info!(
        "loaded users={} products={} interactions={} from {}",
        users_tbl.len(),
        products_tbl.len(),
        interactions_tbl.len(),
        settings.data_dir.display()
    );

    let user_map = build_identifier_map(&users_tbl, "user_id")?;
    let product_map = build_identifier_map(&products_tbl, "product_id")?;
    let interactions = interactions_tbl.interactions()?;

    let remapped = apply_maps(&interactions, &user_map, &product_map, settings.unmapped)?;
    if remapped.unmapped_users > 0 || remapped.unmapped_products > 0 {
        tracing::warn!(
            "interactions reference unknown identifiers: user_id={} product_id={} (policy={:?}, dropped={})",
            remapped.unmapped_users,
            remapped.unmapped_products,
            settings.unmapped,
            remapped.dropped
        );
    }

    let outputs = export(&remapped.rows, &user_map, &product_map, &settings.output_dir)?;

    Ok(PrepSummary {
        users: user_map.len(),
        products: product_map.len(),
        interactions: interactions.len(),
        ratings_written: remapped.rows.len(),
        unmapped_users: remapped.unmapped_users,
        unmapped_products: remapped.unmapped_products,
        dropped: remapped.dropped,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use std::fs;
    use std::path::Path;

    fn write_inputs(dir: &Path, users: &str, products: &str, interactions: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(USERS_FILE), users).unwrap();
        fs::write(dir.join(PRODUCTS_FILE), products).unwrap();
        fs::write(dir.join(INTERACTIONS_FILE), interactions).unwrap();
    }

    fn settings(root: &Path, unmapped: UnmappedPolicy) -> PrepSettings {
        PrepSettings {
            data_dir: root.join("data"),
            output_dir: root.join("recommender").join("Recommender"),
            delimiter: b',',
            unmapped,
        }
    }

    #[test]
    fn end_to_end_remaps_and_exports() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path(), UnmappedPolicy::Keep);
        write_inputs(
            &s.data_dir,
            "user_id,name\nu1,Ann\nu2,Bob\nu3,Cy\n",
            "product_id,title,category,price\np9,Lamp,home,20\np1,Mug,kitchen,8\n",
            "user_id,product_id,rating,ts\nu2,p9,5,100\nu1,p1,3,101\n",
        );
        let summary = run(&s).expect("run ok");
        assert_eq!(summary.users, 3);
        assert_eq!(summary.products, 2);
        assert_eq!(summary.interactions, 2);
        assert_eq!(summary.ratings_written, 2);

        let ratings = fs::read_to_string(&summary.outputs.ratings).unwrap();
        assert_eq!(ratings, "user_idx,product_idx,rating\n1,0,5\n0,1,3\n");
        let users = fs::read_to_string(&summary.outputs.user_map).unwrap();
        assert_eq!(users, ",user_idx\nu1,0\nu2,1\nu3,2\n");
        let products = fs::read_to_string(&summary.outputs.product_map).unwrap();
        assert_eq!(products, ",product_idx\np9,0\np1,1\n");
    }

    #[test]
    fn exported_indices_agree_with_user_map() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path(), UnmappedPolicy::Keep);
        write_inputs(
            &s.data_dir,
            "user_id\nzed\namy\nbo\n",
            "product_id\nx\n",
            "user_id,product_id,rating\nbo,x,1\nzed,x,2\namy,x,3\nbo,x,4\n",
        );
        let summary = run(&s).unwrap();

        let mut map_rdr = csv::Reader::from_path(&summary.outputs.user_map).unwrap();
        let user_map: std::collections::HashMap<String, String> = map_rdr
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_string(), r[1].to_string())
            })
            .collect();
        let mut rat_rdr = csv::Reader::from_path(&summary.outputs.ratings).unwrap();
        let exported: Vec<String> = rat_rdr
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        let expected: Vec<String> = ["bo", "zed", "amy", "bo"]
            .iter()
            .map(|u| user_map[*u].clone())
            .collect();
        assert_eq!(exported, expected);
    }

    #[test]
    fn unmapped_identifier_keeps_row_with_empty_index() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path(), UnmappedPolicy::Keep);
        write_inputs(
            &s.data_dir,
            "user_id\nu1\n",
            "product_id\np1\n",
            "user_id,product_id,rating\nu1,p1,4\nu404,p1,2\n",
        );
        let summary = run(&s).expect("run still succeeds");
        assert_eq!(summary.unmapped_users, 1);
        assert_eq!(summary.ratings_written, 2);
        let ratings = fs::read_to_string(&summary.outputs.ratings).unwrap();
        assert_eq!(ratings, "user_idx,product_idx,rating\n0,0,4\n,0,2\n");
    }

    #[test]
    fn header_only_interactions_write_header_only() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path(), UnmappedPolicy::Keep);
        write_inputs(
            &s.data_dir,
            "user_id\nu1\n",
            "product_id\np1\n",
            "user_id,product_id,rating\n",
        );
        let summary = run(&s).unwrap();
        assert_eq!(summary.ratings_written, 0);
        let ratings = fs::read_to_string(&summary.outputs.ratings).unwrap();
        assert_eq!(ratings, "user_idx,product_idx,rating\n");
    }

    #[test]
    fn short_reference_row_is_still_indexed() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path(), UnmappedPolicy::Keep);
        write_inputs(
            &s.data_dir,
            "user_id,name,age\nu1,Ann,30\nu2,Bob\n",
            "product_id\np1\n",
            "user_id,product_id,rating\nu2,p1,4\n",
        );
        let summary = run(&s).expect("short row accepted");
        assert_eq!(summary.users, 2);
        let users = fs::read_to_string(&summary.outputs.user_map).unwrap();
        assert_eq!(users, ",user_idx\nu1,0\nu2,1\n");
        let ratings = fs::read_to_string(&summary.outputs.ratings).unwrap();
        assert_eq!(ratings, "user_idx,product_idx,rating\n1,0,4\n");
    }

    #[test]
    fn missing_input_aborts_before_output() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path(), UnmappedPolicy::Keep);
        fs::create_dir_all(&s.data_dir).unwrap();
        fs::write(s.data_dir.join(USERS_FILE), "user_id\nu1\n").unwrap();
        fs::write(s.data_dir.join(PRODUCTS_FILE), "product_id\np1\n").unwrap();

        let err = run(&s).unwrap_err();
        assert!(matches!(err, PrepError::MissingInputFile { .. }));
        assert!(!s.output_dir.exists());
    }

    #[test]
    fn fail_policy_aborts_before_output() {
        let tmp = tempfile::tempdir().unwrap();
        let s = settings(tmp.path(), UnmappedPolicy::Fail);
        write_inputs(
            &s.data_dir,
            "user_id\nu1\n",
            "product_id\np1\n",
            "user_id,product_id,rating\nu2,p1,4\n",
        );
        let err = run(&s).unwrap_err();
        assert!(matches!(err, PrepError::UnmappedIdentifier { row: 1, .. }));
        assert!(!s.output_dir.exists());
    }
}
