//! Deadline predicate over configured windows.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sectioning_core::config::{DeadlineConfig, DeadlineWindow};
use sectioning_core::types::id::OfferingId;
use sectioning_entity::offering::Section;

/// The kind of change being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineKind {
    /// Adding a course the student is not enrolled in.
    New,
    /// Swapping sections of an enrolled course.
    Change,
    /// Dropping an enrolled course.
    Drop,
}

impl fmt::Display for DeadlineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Change => write!(f, "change"),
            Self::Drop => write!(f, "drop"),
        }
    }
}

/// Checks per-offering deadline windows. Pure, no side effects.
#[derive(Debug, Clone, Default)]
pub struct DeadlineChecker {
    config: DeadlineConfig,
}

impl DeadlineChecker {
    /// Creates a checker over the configured windows.
    pub fn new(config: DeadlineConfig) -> Self {
        Self { config }
    }

    /// Whether a change of `kind` is still allowed at `time`.
    ///
    /// The absolute end of the offering's window applies to every section;
    /// the relative end applies when the section has a first meeting date.
    pub fn check_deadline(
        &self,
        offering: OfferingId,
        section: Option<&Section>,
        time: DateTime<Utc>,
        kind: DeadlineKind,
    ) -> bool {
        let window = self.config.window_for(offering.get());
        let (absolute, relative) = bounds(window, kind);

        if absolute.is_some_and(|end| time > end) {
            return false;
        }

        let first_meeting = section
            .and_then(|s| s.time.as_ref())
            .and_then(|t| t.first_meeting);
        match (relative, first_meeting) {
            (Some(days), Some(first)) => time.date_naive() <= first + Duration::days(days),
            _ => true,
        }
    }
}

fn bounds(window: &DeadlineWindow, kind: DeadlineKind) -> (Option<DateTime<Utc>>, Option<i64>) {
    match kind {
        DeadlineKind::New => (window.new_end, window.new_days),
        DeadlineKind::Change => (window.change_end, window.change_days),
        DeadlineKind::Drop => (window.drop_end, window.drop_days),
    }
}
