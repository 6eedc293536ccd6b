//! Enrollment weighting strategies for the resectioning search.

use sectioning_core::config::StabilityWeights;
use sectioning_entity::catalog::CatalogSnapshot;
use sectioning_entity::student::{CourseRequest, Enrollment};

/// Scores a candidate enrollment; higher is better.
pub trait EnrollmentWeighting: Send + Sync + std::fmt::Debug {
    /// Weight of `candidate` for `request`, given the enrollment the request
    /// held before (if any).
    fn weight(
        &self,
        snapshot: &CatalogSnapshot,
        request: &CourseRequest,
        previous: Option<&Enrollment>,
        candidate: &Enrollment,
    ) -> f64;
}

/// Prefers earlier choices, then candidates close to the previous
/// enrollment: same sections, times, rooms, and names.
#[derive(Debug, Clone)]
pub struct StabilityWeighting {
    weights: StabilityWeights,
}

impl StabilityWeighting {
    /// Creates the weighting with the configured bonuses.
    pub fn new(weights: StabilityWeights) -> Self {
        Self { weights }
    }
}

impl EnrollmentWeighting for StabilityWeighting {
    fn weight(
        &self,
        snapshot: &CatalogSnapshot,
        request: &CourseRequest,
        previous: Option<&Enrollment>,
        candidate: &Enrollment,
    ) -> f64 {
        let w = &self.weights;
        let mut weight = -w.choice_penalty * choice_index(request, candidate) as f64;
        let Some(previous) = previous else {
            return weight;
        };
        if previous.course_id == candidate.course_id {
            weight += w.same_choice;
        }
        for id in &candidate.sections {
            if previous.contains(*id) {
                weight += w.same_section;
                continue;
            }
            let Some(section) = snapshot.section(*id) else {
                continue;
            };
            let counterpart = previous
                .sections
                .iter()
                .filter_map(|p| snapshot.section(*p))
                .find(|p| {
                    p.subpart_id == section.subpart_id
                        || snapshot.subpart(p.subpart_id).map(|sp| &sp.instructional_type)
                            == snapshot.subpart(section.subpart_id).map(|sp| &sp.instructional_type)
                });
            if let Some(old) = counterpart {
                if old.same_time(section) {
                    weight += w.same_time;
                }
                if old.same_rooms(section) {
                    weight += w.same_room;
                }
                if old.name == section.name {
                    weight += w.same_name;
                }
            }
        }
        weight
    }
}

/// Only the choice order matters; every section combination of a course is
/// equally good.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWeighting;

impl EnrollmentWeighting for UniformWeighting {
    fn weight(
        &self,
        _snapshot: &CatalogSnapshot,
        request: &CourseRequest,
        _previous: Option<&Enrollment>,
        candidate: &Enrollment,
    ) -> f64 {
        -(choice_index(request, candidate) as f64)
    }
}

fn choice_index(request: &CourseRequest, candidate: &Enrollment) -> usize {
    request
        .choice_index(candidate.course_id)
        .unwrap_or(request.courses.len())
}
