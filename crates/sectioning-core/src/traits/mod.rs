//! Core traits defined in `sectioning-core` and implemented by other crates.

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};
