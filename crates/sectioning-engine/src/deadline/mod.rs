//! New/change/drop deadline enforcement.

pub mod checker;

pub use checker::{DeadlineChecker, DeadlineKind};
