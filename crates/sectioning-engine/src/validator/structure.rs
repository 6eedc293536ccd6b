//! Structural rules of one course's section set.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use sectioning_core::types::id::{ConfigId, SectionId, SubpartId};
use sectioning_entity::catalog::CatalogSnapshot;
use sectioning_entity::offering::{DistributionKind, Offering, Section};

/// A structural problem with a section set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    /// A section id is not in the catalog.
    UnknownSection(SectionId),
    /// Sections come from more than one configuration.
    MultipleConfigs(Vec<ConfigId>),
    /// Some subparts have no section.
    Incomplete(Vec<SubpartId>),
    /// More sections than subparts.
    TooMany,
    /// Two sections of the same subpart.
    DuplicateSubpart(SubpartId),
    /// A child section without its parent.
    ParentMismatch {
        /// The child.
        section: SectionId,
        /// Its declared parent.
        parent: SectionId,
    },
    /// A section of a linked group without the rest of the group.
    Unlinked(SectionId),
    /// Two sections overlap in time.
    Overlap(SectionId, SectionId),
}

impl StructureIssue {
    /// The section the issue is reported against, if any.
    pub fn section(&self) -> Option<SectionId> {
        match self {
            Self::UnknownSection(s) | Self::Unlinked(s) => Some(*s),
            Self::ParentMismatch { section, .. } => Some(*section),
            Self::Overlap(a, _) => Some(*a),
            _ => None,
        }
    }

    /// Whether the issue is a time overlap rather than a shape problem.
    pub fn is_overlap(&self) -> bool {
        matches!(self, Self::Overlap(..))
    }
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSection(s) => write!(f, "section {s} does not exist"),
            Self::MultipleConfigs(configs) => {
                write!(f, "sections span {} configurations", configs.len())
            }
            Self::Incomplete(missing) => {
                write!(f, "incomplete enrollment, {} subpart(s) missing", missing.len())
            }
            Self::TooMany => write!(f, "invalid enrollment, too many sections"),
            Self::DuplicateSubpart(sp) => {
                write!(f, "invalid enrollment, subpart {sp} has more than one section")
            }
            Self::ParentMismatch { section, parent } => {
                write!(f, "section {section} requires its parent section {parent}")
            }
            Self::Unlinked(s) => write!(f, "section {s} is linked to sections not selected"),
            Self::Overlap(a, b) => write!(f, "sections {a} and {b} overlap"),
        }
    }
}

/// Whether two sections of the offering may overlap.
pub fn overlap_allowed(
    snapshot: &CatalogSnapshot,
    offering: &Offering,
    a: &Section,
    b: &Section,
) -> bool {
    let subpart_allows = |s: &Section| {
        snapshot
            .subpart(s.subpart_id)
            .is_some_and(|sp| sp.allow_overlap)
    };
    subpart_allows(a) || subpart_allows(b) || offering.allows_overlap(a.id, b.id)
}

/// Lists every structural problem of `sections` as an enrollment in
/// `offering`. An empty result means exactly one section per subpart of a
/// single configuration, consistent parents and links, and no overlaps.
pub fn inspect(
    snapshot: &CatalogSnapshot,
    offering: &Offering,
    sections: &[SectionId],
) -> Vec<StructureIssue> {
    let mut issues = Vec::new();
    let mut resolved: Vec<&Section> = Vec::with_capacity(sections.len());
    let mut configs = BTreeSet::new();
    for id in sections {
        match snapshot
            .section(*id)
            .zip(snapshot.config_of_section(*id))
        {
            Some((section, config)) if config.offering_id == offering.id => {
                resolved.push(section);
                configs.insert(config.id);
            }
            _ => issues.push(StructureIssue::UnknownSection(*id)),
        }
    }
    if configs.len() > 1 {
        issues.push(StructureIssue::MultipleConfigs(configs.into_iter().collect()));
        return issues;
    }
    let Some(config) = configs.first().and_then(|id| snapshot.config(*id)) else {
        issues.push(StructureIssue::Incomplete(Vec::new()));
        return issues;
    };

    let mut by_subpart: BTreeMap<SubpartId, usize> = BTreeMap::new();
    for section in &resolved {
        *by_subpart.entry(section.subpart_id).or_default() += 1;
    }
    let missing: Vec<SubpartId> = config
        .subparts
        .iter()
        .filter(|sp| !by_subpart.contains_key(sp))
        .copied()
        .collect();
    if !missing.is_empty() {
        issues.push(StructureIssue::Incomplete(missing));
    }
    for (subpart, count) in &by_subpart {
        if *count > 1 {
            issues.push(StructureIssue::DuplicateSubpart(*subpart));
        }
    }
    if resolved.len() > config.subparts.len() {
        issues.push(StructureIssue::TooMany);
    }

    for section in &resolved {
        if let Some(parent) = section.parent_id {
            if !sections.contains(&parent) {
                issues.push(StructureIssue::ParentMismatch {
                    section: section.id,
                    parent,
                });
            }
        }
    }

    for distribution in &offering.distributions {
        if distribution.kind != DistributionKind::LinkedSections {
            continue;
        }
        let linked: Vec<SectionId> = distribution
            .sections
            .iter()
            .filter(|s| {
                snapshot
                    .config_of_section(**s)
                    .is_some_and(|c| c.id == config.id)
            })
            .copied()
            .collect();
        if linked.iter().any(|s| sections.contains(s)) {
            if let Some(missing) = linked.iter().find(|s| !sections.contains(s)) {
                issues.push(StructureIssue::Unlinked(*missing));
            }
        }
    }

    for (i, a) in resolved.iter().enumerate() {
        for b in &resolved[i + 1..] {
            if a.overlaps(b) && !overlap_allowed(snapshot, offering, a, b) {
                issues.push(StructureIssue::Overlap(a.id, b.id));
            }
        }
    }

    issues
}
