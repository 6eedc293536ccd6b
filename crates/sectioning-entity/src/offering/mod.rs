//! Instructional offerings and their structure.

pub mod config;
pub mod distribution;
pub mod model;
pub mod section;
pub mod time;

pub use config::{InstrConfig, Subpart};
pub use distribution::{Distribution, DistributionKind};
pub use model::{Course, Offering};
pub use section::Section;
pub use time::TimeLocation;

/// Limit value meaning "no limit".
pub const UNLIMITED: i32 = -1;

/// Whether `enrolled` students fill a level with the given limit.
pub fn is_full(limit: i32, enrolled: usize) -> bool {
    limit >= 0 && enrolled >= limit as usize
}

/// Remaining space under a limit, `None` when unlimited.
pub fn remaining(limit: i32, enrolled: usize) -> Option<i64> {
    if limit < 0 {
        None
    } else {
        Some(i64::from(limit) - enrolled as i64)
    }
}
