//! Immutable catalog arena.

pub mod snapshot;

pub use snapshot::{CatalogData, CatalogSnapshot};
