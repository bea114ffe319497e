//! Identifier remapping: build dense maps from reference tables and apply
//! them to interaction rows.

use crate::error::{PrepError, Result};
use crate::model::{IdentifierMap, Interaction, RemappedInteraction};
use crate::table::Table;

/// What to do with an interaction whose identifier is missing from its
/// reference table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmappedPolicy {
    /// Keep the row with an empty index.
    #[default]
    Keep,
    /// Remove the row.
    Drop,
    /// Abort the run.
    Fail,
}

impl UnmappedPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Some(Self::Keep),
            "drop" => Some(Self::Drop),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

/// Result of applying identifier maps to an interaction table.
#[derive(Debug, Clone, Default)]
pub struct Remapped {
    pub rows: Vec<RemappedInteraction>,
    pub unmapped_users: usize,
    pub unmapped_products: usize,
    pub dropped: usize,
}

/// Scan `key_column` of `table` in row order and assign each distinct value
/// the next index on first occurrence.
pub fn build_identifier_map(table: &Table, key_column: &str) -> Result<IdentifierMap> {
    let mut map = IdentifierMap::new();
    let mut repeats = 0usize;
    for id in table.column(key_column)? {
        if !map.insert(id) {
            repeats += 1;
        }
    }
    if repeats > 0 {
        tracing::debug!(
            "{}: ignored {} repeated '{}' value(s)",
            table.path().display(),
            repeats,
            key_column
        );
    }
    tracing::debug!(
        "built '{}' map from {}: {} row(s) -> {} index(es)",
        key_column,
        table.path().display(),
        table.len(),
        map.len()
    );
    Ok(map)
}

/// Replace `user_id`/`product_id` with their dense indices, preserving row
/// order. Unknown identifiers are handled per `policy`.
pub fn apply_maps(
    interactions: &[Interaction],
    users: &IdentifierMap,
    products: &IdentifierMap,
    policy: UnmappedPolicy,
) -> Result<Remapped> {
    let mut out = Remapped {
        rows: Vec::with_capacity(interactions.len()),
        ..Default::default()
    };
    for (i, it) in interactions.iter().enumerate() {
        let user_idx = users.get(&it.user_id);
        let product_idx = products.get(&it.product_id);

        if user_idx.is_none() {
            out.unmapped_users += 1;
        }
        if product_idx.is_none() {
            out.unmapped_products += 1;
        }
        if user_idx.is_none() || product_idx.is_none() {
            match policy {
                UnmappedPolicy::Keep => {}
                UnmappedPolicy::Drop => {
                    tracing::debug!(
                        "dropping interaction row {} (user_id='{}', product_id='{}')",
                        i + 1,
                        it.user_id,
                        it.product_id
                    );
                    out.dropped += 1;
                    continue;
                }
                UnmappedPolicy::Fail => {
                    let (column, value) = if user_idx.is_none() {
                        ("user_id", &it.user_id)
                    } else {
                        ("product_id", &it.product_id)
                    };
                    return Err(PrepError::UnmappedIdentifier {
                        row: i + 1,
                        column,
                        value: value.clone(),
                    });
                }
            }
        }

        out.rows.push(RemappedInteraction {
            user_idx,
            product_idx,
            rating: it.rating.clone(),
        });
    }
    Ok(out)
}
