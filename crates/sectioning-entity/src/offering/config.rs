//! Instructional configurations and scheduling subparts.

use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{ConfigId, OfferingId, SectionId, SubpartId};

/// A complete schedule pattern of an offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrConfig {
    /// Unique configuration identifier.
    pub id: ConfigId,
    /// The owning offering.
    pub offering_id: OfferingId,
    /// Configuration name.
    pub name: String,
    /// Enrollment limit, `-1` for unlimited.
    pub limit: i32,
    /// Subparts, parents before children.
    pub subparts: Vec<SubpartId>,
    /// Students in this configuration may overlap with other courses.
    #[serde(default)]
    pub allow_overlap: bool,
}

/// An instructional component (lecture, lab, ...) of a configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subpart {
    /// Unique subpart identifier.
    pub id: SubpartId,
    /// The owning configuration.
    pub config_id: ConfigId,
    /// Instructional type (e.g. `Lec`, `Lab`).
    pub instructional_type: String,
    /// Parent subpart, if nested.
    #[serde(default)]
    pub parent_id: Option<SubpartId>,
    /// Sections offered under this subpart.
    pub sections: Vec<SectionId>,
    /// Sections of this subpart may overlap with anything.
    #[serde(default)]
    pub allow_overlap: bool,
}
