//! Enrollment deadline windows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time windows for new enrollments, changes, and drops.
///
/// Absolute ends are compared against the request time. Relative ends are
/// counted in days from the first meeting of the section being checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeadlineWindow {
    /// Last instant a student may add a new course.
    #[serde(default)]
    pub new_end: Option<DateTime<Utc>>,
    /// Last instant a student may change sections of an enrolled course.
    #[serde(default)]
    pub change_end: Option<DateTime<Utc>>,
    /// Last instant a student may drop an enrolled course.
    #[serde(default)]
    pub drop_end: Option<DateTime<Utc>>,
    /// Days after a section's first meeting during which it may be added.
    #[serde(default)]
    pub new_days: Option<i64>,
    /// Days after a section's first meeting during which it may be swapped in.
    #[serde(default)]
    pub change_days: Option<i64>,
    /// Days after a section's first meeting during which it may be dropped.
    #[serde(default)]
    pub drop_days: Option<i64>,
}

/// Deadline configuration: a default window plus per-offering overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadlineConfig {
    /// Window applied to offerings without an override.
    #[serde(default)]
    pub default: DeadlineWindow,
    /// Overrides keyed by offering id.
    #[serde(default)]
    pub offerings: HashMap<String, DeadlineWindow>,
}

impl DeadlineConfig {
    /// Returns the window that governs the given offering.
    pub fn window_for(&self, offering_id: u64) -> &DeadlineWindow {
        self.offerings
            .get(&offering_id.to_string())
            .unwrap_or(&self.default)
    }
}
