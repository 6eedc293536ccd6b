//! Reservation and capacity arithmetic.
//!
//! Pure predicates over a catalog snapshot and the current enrollments of
//! one offering. Used by the validator and the resectioning search.

pub mod capacity;
pub mod reservation;

pub use capacity::{CapacityCheck, CapacityLevel, Shortfall};
pub use reservation::Quota;
