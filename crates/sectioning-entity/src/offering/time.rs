//! Meeting time of a section.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day bit for Monday.
pub const MONDAY: u8 = 1;
/// Day bit for Tuesday.
pub const TUESDAY: u8 = 1 << 1;
/// Day bit for Wednesday.
pub const WEDNESDAY: u8 = 1 << 2;
/// Day bit for Thursday.
pub const THURSDAY: u8 = 1 << 3;
/// Day bit for Friday.
pub const FRIDAY: u8 = 1 << 4;
/// Day bit for Saturday.
pub const SATURDAY: u8 = 1 << 5;
/// Day bit for Sunday.
pub const SUNDAY: u8 = 1 << 6;

/// Weekly meeting pattern of a section.
///
/// `start_slot` and `length` are in 5-minute slots from midnight;
/// `weeks` has bit `n` set when the section meets in week `n` of the term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLocation {
    /// Meeting days bitmask.
    pub days: u8,
    /// First slot of the meeting.
    pub start_slot: u16,
    /// Number of slots.
    pub length: u16,
    /// Meeting weeks bitmask.
    #[serde(default = "all_weeks")]
    pub weeks: u64,
    /// Date of the first meeting, when known.
    #[serde(default)]
    pub first_meeting: Option<NaiveDate>,
}

impl TimeLocation {
    /// Creates a time meeting every week of the term.
    pub fn new(days: u8, start_slot: u16, length: u16) -> Self {
        Self {
            days,
            start_slot,
            length,
            weeks: all_weeks(),
            first_meeting: None,
        }
    }

    /// Sets the first meeting date.
    pub fn starting(mut self, first_meeting: NaiveDate) -> Self {
        self.first_meeting = Some(first_meeting);
        self
    }

    /// Whether the two meetings share a day, a week, and a slot.
    pub fn overlaps(&self, other: &TimeLocation) -> bool {
        if self.days & other.days == 0 || self.weeks & other.weeks == 0 {
            return false;
        }
        let (a_start, a_end) = (
            u32::from(self.start_slot),
            u32::from(self.start_slot) + u32::from(self.length),
        );
        let (b_start, b_end) = (
            u32::from(other.start_slot),
            u32::from(other.start_slot) + u32::from(other.length),
        );
        a_start < b_end && b_start < a_end
    }

    /// Whether both meetings use exactly the same pattern.
    pub fn same_time(&self, other: &TimeLocation) -> bool {
        self.days == other.days
            && self.start_slot == other.start_slot
            && self.length == other.length
            && self.weeks == other.weeks
    }

    /// Whether the first meeting happened before `today`.
    pub fn has_started(&self, today: NaiveDate) -> bool {
        self.first_meeting.is_some_and(|first| first < today)
    }
}

fn all_weeks() -> u64 {
    u64::MAX
}
