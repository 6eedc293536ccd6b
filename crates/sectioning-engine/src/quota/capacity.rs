//! Capacity checks at section, config, and course level.

use std::fmt;

use serde::{Deserialize, Serialize};

use sectioning_core::types::id::{ConfigId, CourseId, ReservationId, SectionId, StudentId};
use sectioning_entity::offering::{self, InstrConfig, Section};
use sectioning_entity::reservation::Reservation;
use sectioning_entity::student::{RequestOverrides, Student};

use super::reservation::Quota;

/// A level at which enrollment is limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityLevel {
    /// A single section.
    Section,
    /// An instructional configuration.
    Config,
    /// A course name.
    Course,
}

impl fmt::Display for CapacityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section => write!(f, "section"),
            Self::Config => write!(f, "config"),
            Self::Course => write!(f, "course"),
        }
    }
}

/// A level without room for the student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    /// The full level.
    pub level: CapacityLevel,
    /// The offending section (section level) or the first section of the
    /// selection (config/course level).
    pub section: Option<SectionId>,
    /// Nominal limit of the level.
    pub limit: i32,
    /// Other students already counted at the level.
    pub enrolled: usize,
}

/// Outcome of a capacity check.
#[derive(Debug, Clone, Default)]
pub struct CapacityCheck {
    /// Reservation the enrollment would be attributed to.
    pub reservation: Option<ReservationId>,
    /// Whether the attributed reservation permits time conflicts.
    pub allow_overlap: bool,
    /// Levels without room.
    pub shortfalls: Vec<Shortfall>,
}

impl CapacityCheck {
    /// Whether every level had room.
    pub fn is_ok(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

impl<'a> Quota<'a> {
    /// Checks section, config, and course limits for a selection.
    ///
    /// The check is skipped when the request carries a capacity override or
    /// an applicable reservation may exceed limits. A level covered by the
    /// reservation the student would be attributed to is not limited. Other
    /// levels are checked against nominal limits for a reservation holder,
    /// and against unreserved space for everyone else. Levels the student is
    /// already counted in are not checked.
    pub fn check_capacity(
        &self,
        student: &Student,
        overrides: RequestOverrides,
        course: CourseId,
        config: &InstrConfig,
        sections: &[SectionId],
    ) -> CapacityCheck {
        let applicable = self.applicable_reservations(student, course, Some(config), sections);
        let selected = self.select_reservation(student, course, Some(config), sections);
        let mut check = CapacityCheck {
            reservation: selected.map(|r| r.id),
            allow_overlap: selected.is_some_and(|r| r.allow_overlap),
            shortfalls: Vec::new(),
        };

        if overrides.capacity || applicable.iter().any(|r| r.can_assign_over_limit) {
            return check;
        }

        let first = sections.first().copied();
        let previous = self.enrollments.of_student(student.id).map(|r| &r.enrollment);
        let mut check_level = |level: CapacityLevel, section: Option<&Section>| {
            let space = match selected {
                Some(r) if self.reservation_covers(r, level, config.id, section) => return,
                Some(_) => {
                    let (limit, enrolled) = self.usage(level, student.id, course, config, section);
                    offering::remaining(limit, enrolled)
                }
                None => self.unreserved_space(level, student.id, course, config, section, &applicable),
            };
            if space.is_none_or(|space| space > 0) {
                return;
            }
            let (limit, enrolled) = self.usage(level, student.id, course, config, section);
            check.shortfalls.push(Shortfall {
                level,
                section: section.map(|s| s.id).or(first),
                limit,
                enrolled,
            });
        };

        for id in sections {
            let Some(section) = self.snapshot.section(*id) else {
                continue;
            };
            if !previous.is_some_and(|e| e.contains(*id)) {
                check_level(CapacityLevel::Section, Some(section));
            }
        }
        if !previous.is_some_and(|e| e.config_id == config.id) {
            check_level(CapacityLevel::Config, None);
        }
        if !previous.is_some_and(|e| e.course_id == course) {
            check_level(CapacityLevel::Course, None);
        }

        check
    }

    /// Remaining space at a level after subtracting space held back for
    /// reservations not in `applicable`. `None` when unlimited.
    pub fn unreserved_space(
        &self,
        level: CapacityLevel,
        student: StudentId,
        course: CourseId,
        config: &InstrConfig,
        section: Option<&Section>,
        applicable: &[&Reservation],
    ) -> Option<i64> {
        let (limit, enrolled) = self.usage(level, student, course, config, section);
        let remaining = offering::remaining(limit, enrolled)?;
        match self.held_back(level, student, config, section, applicable) {
            Some(held) => Some(remaining - held),
            None => Some(0),
        }
    }

    /// Whether the section could take the student on capacity grounds: it
    /// is below its nominal limit, the request overrides capacity, or an
    /// applicable reservation either exceeds limits or covers the section
    /// with room to spare.
    pub fn section_admits(
        &self,
        student: &Student,
        overrides: RequestOverrides,
        course: CourseId,
        config: &InstrConfig,
        section: &Section,
    ) -> bool {
        if overrides.capacity {
            return true;
        }
        let (limit, enrolled) = self.usage(CapacityLevel::Section, student.id, course, config, Some(section));
        if !offering::is_full(limit, enrolled) {
            return true;
        }
        self.applicable_reservations(student, course, Some(config), &[section.id])
            .into_iter()
            .any(|r| {
                r.can_assign_over_limit
                    || (!self.is_exhausted(r, student.id)
                        && self.reservation_covers(r, CapacityLevel::Section, config.id, Some(section)))
            })
    }

    /// Whether a reservation attributed to the student lifts the limit of
    /// the level. Unrestricted reservations cover every level.
    fn reservation_covers(
        &self,
        reservation: &Reservation,
        level: CapacityLevel,
        config: ConfigId,
        section: Option<&Section>,
    ) -> bool {
        !reservation.is_restricted() || self.covers(reservation, level, config, section)
    }

    /// Limit of a level and the other students already counted in it.
    fn usage(
        &self,
        level: CapacityLevel,
        student: StudentId,
        course: CourseId,
        config: &InstrConfig,
        section: Option<&Section>,
    ) -> (i32, usize) {
        let previous = self.enrollments.of_student(student).map(|r| &r.enrollment);
        let own = |counted: bool| usize::from(counted);
        match (level, section) {
            (CapacityLevel::Section, Some(section)) => (
                section.limit,
                self.enrollments.count_section(section.id)
                    - own(previous.is_some_and(|e| e.contains(section.id))),
            ),
            (CapacityLevel::Config, _) | (CapacityLevel::Section, None) => (
                config.limit,
                self.enrollments.count_config(config.id)
                    - own(previous.is_some_and(|e| e.config_id == config.id)),
            ),
            (CapacityLevel::Course, _) => (
                self.snapshot.course(course).map_or(offering::UNLIMITED, |c| c.limit),
                self.enrollments.count_course(course)
                    - own(previous.is_some_and(|e| e.course_id == course)),
            ),
        }
    }

    /// Space held back at a level for reservations that do not apply.
    /// `None` when an unlimited reservation holds all of it.
    fn held_back(
        &self,
        level: CapacityLevel,
        student: StudentId,
        config: &InstrConfig,
        section: Option<&Section>,
        applicable: &[&Reservation],
    ) -> Option<i64> {
        let mut held = 0i64;
        for reservation in self.active_reservations() {
            if applicable.iter().any(|r| r.id == reservation.id) {
                continue;
            }
            if !self.covers(reservation, level, config.id, section) {
                continue;
            }
            held += self.remaining(reservation, student)?;
        }
        Some(held)
    }

    fn covers(
        &self,
        reservation: &Reservation,
        level: CapacityLevel,
        config: ConfigId,
        section: Option<&Section>,
    ) -> bool {
        match (level, section) {
            (CapacityLevel::Section, Some(section)) => {
                if reservation.sections.contains(&section.id) {
                    return true;
                }
                let restricts_subpart = self
                    .snapshot
                    .subpart(section.subpart_id)
                    .is_some_and(|sp| sp.sections.iter().any(|s| reservation.sections.contains(s)));
                reservation.configs.contains(&config) && !restricts_subpart
            }
            (CapacityLevel::Config, _) | (CapacityLevel::Section, None) => {
                reservation.configs.contains(&config)
                    || reservation
                        .sections
                        .iter()
                        .any(|s| self.snapshot.config_of_section(*s).is_some_and(|c| c.id == config))
            }
            (CapacityLevel::Course, _) => true,
        }
    }
}
