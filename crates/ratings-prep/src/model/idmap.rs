//! Dense, first-seen-ordered identifier index.

use indexmap::IndexSet;

/// Maps original string identifiers to dense zero-based indices.
///
/// The index of an identifier is its insertion position, so iteration order
/// is first-seen order and indices are always `0..len()`.
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    ids: IndexSet<String>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if unseen. Returns `false` for a repeat, which keeps its
    /// original index.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string())
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.ids.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// `(id, index)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.ids.iter().enumerate().map(|(i, id)| (id.as_str(), i))
    }
}
