//! Domain types: interaction rows and dense identifier maps.

pub mod idmap;
pub mod types;

pub use idmap::*;
pub use types::*;
