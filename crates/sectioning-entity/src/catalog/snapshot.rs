//! Catalog snapshot: every catalog entity indexed by id.
//!
//! Entities reference each other by id only. The snapshot is built once from
//! flat [`CatalogData`], checked for dangling references, and then shared
//! read-only; a catalog reload swaps in a whole new snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use sectioning_core::error::AppError;
use sectioning_core::result::AppResult;
use sectioning_core::types::id::{
    ConfigId, CourseId, OfferingId, ReservationId, SectionId, SubpartId,
};

use crate::offering::{Course, InstrConfig, Offering, Section, Subpart};
use crate::reservation::Reservation;

/// Flat catalog contents as loaded from a fixture or an upstream feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Offerings.
    #[serde(default)]
    pub offerings: Vec<Offering>,
    /// Course names.
    #[serde(default)]
    pub courses: Vec<Course>,
    /// Configurations.
    #[serde(default)]
    pub configs: Vec<InstrConfig>,
    /// Subparts.
    #[serde(default)]
    pub subparts: Vec<Subpart>,
    /// Sections.
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Reservations.
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

/// Indexed, validated catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    offerings: HashMap<OfferingId, Offering>,
    courses: HashMap<CourseId, Course>,
    configs: HashMap<ConfigId, InstrConfig>,
    subparts: HashMap<SubpartId, Subpart>,
    sections: HashMap<SectionId, Section>,
    reservations: HashMap<ReservationId, Reservation>,
}

impl CatalogSnapshot {
    /// Indexes the data and verifies that all references resolve.
    pub fn build(data: CatalogData) -> AppResult<Self> {
        let snapshot = Self {
            offerings: index(data.offerings, |o| o.id, "offering")?,
            courses: index(data.courses, |c| c.id, "course")?,
            configs: index(data.configs, |c| c.id, "config")?,
            subparts: index(data.subparts, |s| s.id, "subpart")?,
            sections: index(data.sections, |s| s.id, "section")?,
            reservations: index(data.reservations, |r| r.id, "reservation")?,
        };
        snapshot.check_references()?;
        Ok(snapshot)
    }

    fn check_references(&self) -> AppResult<()> {
        for offering in self.offerings.values() {
            if !offering.has_course(offering.controlling_course_id) {
                return Err(AppError::validation(format!(
                    "offering {} does not list its controlling course {}",
                    offering.id, offering.controlling_course_id
                )));
            }
            for course in &offering.courses {
                match self.courses.get(course) {
                    Some(c) if c.offering_id == offering.id => {}
                    _ => return Err(dangling("offering", offering.id, "course", course)),
                }
            }
            for config in &offering.configs {
                match self.configs.get(config) {
                    Some(c) if c.offering_id == offering.id => {}
                    _ => return Err(dangling("offering", offering.id, "config", config)),
                }
            }
            for reservation in &offering.reservations {
                match self.reservations.get(reservation) {
                    Some(r) if r.offering_id == offering.id => {}
                    _ => {
                        return Err(dangling(
                            "offering",
                            offering.id,
                            "reservation",
                            reservation,
                        ));
                    }
                }
            }
        }
        for config in self.configs.values() {
            for subpart_id in &config.subparts {
                let subpart = match self.subparts.get(subpart_id) {
                    Some(s) if s.config_id == config.id => s,
                    _ => return Err(dangling("config", config.id, "subpart", subpart_id)),
                };
                if let Some(parent) = subpart.parent_id {
                    if !config.subparts.contains(&parent) {
                        return Err(dangling("subpart", subpart.id, "parent subpart", parent));
                    }
                }
                for section_id in &subpart.sections {
                    let section = match self.sections.get(section_id) {
                        Some(s) if s.subpart_id == subpart.id => s,
                        _ => return Err(dangling("subpart", subpart.id, "section", section_id)),
                    };
                    match (section.parent_id, subpart.parent_id) {
                        (None, None) => {}
                        (Some(parent), Some(parent_subpart)) => {
                            let ok = self
                                .sections
                                .get(&parent)
                                .is_some_and(|p| p.subpart_id == parent_subpart);
                            if !ok {
                                return Err(AppError::validation(format!(
                                    "section {} parent {} is not in the parent subpart",
                                    section.id, parent
                                )));
                            }
                        }
                        _ => {
                            return Err(AppError::validation(format!(
                                "section {} parent does not match its subpart nesting",
                                section.id
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Looks up an offering.
    pub fn offering(&self, id: OfferingId) -> Option<&Offering> {
        self.offerings.get(&id)
    }

    /// Looks up a course.
    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(&id)
    }

    /// Looks up a configuration.
    pub fn config(&self, id: ConfigId) -> Option<&InstrConfig> {
        self.configs.get(&id)
    }

    /// Looks up a subpart.
    pub fn subpart(&self, id: SubpartId) -> Option<&Subpart> {
        self.subparts.get(&id)
    }

    /// Looks up a section.
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(&id)
    }

    /// Looks up a reservation.
    pub fn reservation(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.get(&id)
    }

    /// The offering a course belongs to.
    pub fn offering_of_course(&self, course: CourseId) -> Option<&Offering> {
        self.course(course)
            .and_then(|c| self.offerings.get(&c.offering_id))
    }

    /// The configuration a section belongs to.
    pub fn config_of_section(&self, section: SectionId) -> Option<&InstrConfig> {
        let section = self.section(section)?;
        let subpart = self.subpart(section.subpart_id)?;
        self.config(subpart.config_id)
    }

    /// The offering a section belongs to.
    pub fn offering_of_section(&self, section: SectionId) -> Option<&Offering> {
        self.config_of_section(section)
            .and_then(|c| self.offerings.get(&c.offering_id))
    }

    /// Subparts of a configuration, parents first.
    pub fn subparts_of(&self, config: &InstrConfig) -> Vec<&Subpart> {
        config
            .subparts
            .iter()
            .filter_map(|id| self.subparts.get(id))
            .collect()
    }

    /// Sections of a subpart.
    pub fn sections_of(&self, subpart: &Subpart) -> Vec<&Section> {
        subpart
            .sections
            .iter()
            .filter_map(|id| self.sections.get(id))
            .collect()
    }

    /// Configurations of an offering.
    pub fn configs_of(&self, offering: &Offering) -> Vec<&InstrConfig> {
        offering
            .configs
            .iter()
            .filter_map(|id| self.configs.get(id))
            .collect()
    }

    /// Reservations of an offering.
    pub fn reservations_of(&self, offering: &Offering) -> Vec<&Reservation> {
        offering
            .reservations
            .iter()
            .filter_map(|id| self.reservations.get(id))
            .collect()
    }

    /// All offerings, in id order.
    pub fn offerings(&self) -> Vec<&Offering> {
        let mut all: Vec<&Offering> = self.offerings.values().collect();
        all.sort_by_key(|o| o.id);
        all
    }

    /// Number of indexed sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

fn index<K, T>(items: Vec<T>, key: impl Fn(&T) -> K, what: &str) -> AppResult<HashMap<K, T>>
where
    K: std::hash::Hash + Eq + std::fmt::Display + Copy,
{
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let id = key(&item);
        if map.insert(id, item).is_some() {
            return Err(AppError::validation(format!("duplicate {what} id {id}")));
        }
    }
    Ok(map)
}

fn dangling(
    owner: &str,
    owner_id: impl std::fmt::Display,
    what: &str,
    id: impl std::fmt::Display,
) -> AppError {
    AppError::not_found(format!("{owner} {owner_id} references unknown {what} {id}"))
}
