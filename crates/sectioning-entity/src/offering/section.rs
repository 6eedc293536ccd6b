//! Class section entity.

use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{SectionId, SubpartId};

use super::time::TimeLocation;

/// A schedulable class under a subpart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Unique section identifier.
    pub id: SectionId,
    /// The subpart this section belongs to.
    pub subpart_id: SubpartId,
    /// Section name (e.g. `Lec 1`).
    pub name: String,
    /// Enrollment limit, `-1` for unlimited.
    pub limit: i32,
    /// Parent section in the parent subpart, if nested.
    #[serde(default)]
    pub parent_id: Option<SectionId>,
    /// Meeting time, if assigned.
    #[serde(default)]
    pub time: Option<TimeLocation>,
    /// Assigned rooms.
    #[serde(default)]
    pub rooms: Vec<String>,
    /// Assigned instructors.
    #[serde(default)]
    pub instructors: Vec<String>,
    /// Whether the section has been cancelled.
    #[serde(default)]
    pub cancelled: bool,
}

impl Section {
    /// Whether both sections have times and those times overlap.
    pub fn overlaps(&self, other: &Section) -> bool {
        match (&self.time, &other.time) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => false,
        }
    }

    /// Whether both sections meet at the same time.
    pub fn same_time(&self, other: &Section) -> bool {
        match (&self.time, &other.time) {
            (Some(a), Some(b)) => a.same_time(b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Whether both sections use the same rooms.
    pub fn same_rooms(&self, other: &Section) -> bool {
        !self.rooms.is_empty() && self.rooms == other.rooms
    }
}
