//! Inter-section distribution constraints.

use serde::{Deserialize, Serialize};

use sectioning_core::types::id::SectionId;

/// Kind of distribution constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    /// The listed sections may overlap each other.
    AllowOverlap,
    /// A student in one listed section of a config must attend all listed
    /// sections of that config.
    LinkedSections,
}

/// A distribution constraint over sections of one offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    /// Constraint kind.
    pub kind: DistributionKind,
    /// Sections covered by the constraint.
    pub sections: Vec<SectionId>,
}

impl Distribution {
    /// Whether the constraint covers the section.
    pub fn contains(&self, section: SectionId) -> bool {
        self.sections.contains(&section)
    }

    /// Whether this constraint allows the two sections to overlap.
    pub fn allows_overlap(&self, a: SectionId, b: SectionId) -> bool {
        self.kind == DistributionKind::AllowOverlap && self.contains(a) && self.contains(b)
    }
}
