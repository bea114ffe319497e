//! Interaction rows before and after remapping.

/// One row of `interactions.csv`, restricted to the columns we use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub user_id: String,
    pub product_id: String,
    /// Kept as the original text so it round-trips unchanged.
    pub rating: String,
}

/// An interaction with identifiers replaced by dense indices.
///
/// `None` is the missing-value marker for an identifier that is absent from
/// its reference table; it is written as an empty field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemappedInteraction {
    pub user_idx: Option<usize>,
    pub product_idx: Option<usize>,
    pub rating: String,
}
