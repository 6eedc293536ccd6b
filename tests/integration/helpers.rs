//! Shared test helpers for integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use tokio::sync::broadcast;

use sectioning_core::config::AppConfig;
use sectioning_core::error::AppError;
use sectioning_core::events::DomainEvent;
use sectioning_core::result::AppResult;
use sectioning_core::traits::clock::FixedClock;
use sectioning_core::types::id::{ConfigId, CourseId, OfferingId, RequestId, SectionId, StudentId};
use sectioning_engine::{
    ChannelNotifier, Engine, EngineContext, EnrollmentProvider, EnrollmentStore,
    MemoryEnrollmentStore,
};
use sectioning_entity::assignment::ClassAssignment;
use sectioning_entity::catalog::{CatalogData, CatalogSnapshot};
use sectioning_entity::offering::Offering;
use sectioning_entity::student::{CourseRequest, Enrollment, Request, Student, StudentPriority};

/// MATH 101: Lec 10 (limit 30, MWF 9:00) with child recitations 11 and 12
/// (limit 20 each, Tue/Thu). Wait-listed and re-scheduled.
pub const MATH: u64 = 1;
/// CHEM 110: Lec 20 (limit 2, MWF 9:00) and Lec 21 (limit 2, MWF 13:00).
/// Wait-listed, not re-scheduled.
pub const CHEM: u64 = 2;
/// PHYS 150 (course 3) cross-listed as ASTR 150 (course 4): Lec 30
/// (limit 1, Tue 14:00). Wait-listed.
pub const PHYS: u64 = 3;
/// ASTR 150, the cross-listed name of PHYS 150.
pub const ASTR: u64 = 4;

/// Fixed "now" of every test: before the term starts.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap()
}

/// The test catalog.
pub fn catalog() -> CatalogData {
    serde_json::from_value(json!({
        "offerings": [
            { "id": 1, "name": "MATH 101", "controlling_course_id": 1, "courses": [1],
              "configs": [1], "wait_list": true, "reschedule": true },
            { "id": 2, "name": "CHEM 110", "controlling_course_id": 2, "courses": [2],
              "configs": [2], "wait_list": true, "reschedule": false },
            { "id": 3, "name": "PHYS 150", "controlling_course_id": 3, "courses": [3, 4],
              "configs": [3], "wait_list": true, "reschedule": true }
        ],
        "courses": [
            { "id": 1, "offering_id": 1, "subject": "MATH", "number": "101", "limit": -1 },
            { "id": 2, "offering_id": 2, "subject": "CHEM", "number": "110", "limit": -1 },
            { "id": 3, "offering_id": 3, "subject": "PHYS", "number": "150", "limit": -1 },
            { "id": 4, "offering_id": 3, "subject": "ASTR", "number": "150", "limit": -1 }
        ],
        "configs": [
            { "id": 1, "offering_id": 1, "name": "Lec-Rec", "limit": -1, "subparts": [1, 2] },
            { "id": 2, "offering_id": 2, "name": "Lec", "limit": -1, "subparts": [3] },
            { "id": 3, "offering_id": 3, "name": "Lec", "limit": -1, "subparts": [4] }
        ],
        "subparts": [
            { "id": 1, "config_id": 1, "instructional_type": "Lec", "sections": [10] },
            { "id": 2, "config_id": 1, "instructional_type": "Rec", "parent_id": 1, "sections": [11, 12] },
            { "id": 3, "config_id": 2, "instructional_type": "Lec", "sections": [20, 21] },
            { "id": 4, "config_id": 3, "instructional_type": "Lec", "sections": [30] }
        ],
        "sections": [
            { "id": 10, "subpart_id": 1, "name": "Lec 1", "limit": 30,
              "time": { "days": 21, "start_slot": 108, "length": 12 } },
            { "id": 11, "subpart_id": 2, "name": "Rec 1", "limit": 20, "parent_id": 10,
              "time": { "days": 2, "start_slot": 120, "length": 12 } },
            { "id": 12, "subpart_id": 2, "name": "Rec 2", "limit": 20, "parent_id": 10,
              "time": { "days": 8, "start_slot": 120, "length": 12 } },
            { "id": 20, "subpart_id": 3, "name": "Lec 1", "limit": 2,
              "time": { "days": 21, "start_slot": 108, "length": 12 } },
            { "id": 21, "subpart_id": 3, "name": "Lec 2", "limit": 2,
              "time": { "days": 21, "start_slot": 156, "length": 12 } },
            { "id": 30, "subpart_id": 4, "name": "Lec 1", "limit": 1,
              "time": { "days": 2, "start_slot": 168, "length": 18 } }
        ]
    }))
    .unwrap()
}

/// Test configuration with a fixed tie-breaking seed.
pub fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.search.random_seed = Some(7);
    config
}

/// Test application context
pub struct TestApp {
    /// The engine under test
    pub engine: Engine,
    /// In-memory system of record
    pub store: Arc<MemoryEnrollmentStore>,
    /// Notification subscription opened before any operation
    pub events: broadcast::Receiver<DomainEvent>,
    /// The engine's clock
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    /// Create an app over the default catalog and configuration
    pub fn new(students: Vec<Student>) -> Self {
        Self::build(config(), catalog(), students, None)
    }

    /// Create an app with a custom enrollment provider
    pub fn with_provider(students: Vec<Student>, provider: Arc<dyn EnrollmentProvider>) -> Self {
        Self::build(config(), catalog(), students, Some(provider))
    }

    /// Create an app from explicit parts
    pub fn build(
        config: AppConfig,
        data: CatalogData,
        students: Vec<Student>,
        provider: Option<Arc<dyn EnrollmentProvider>>,
    ) -> Self {
        let snapshot = CatalogSnapshot::build(data).expect("Failed to build test catalog");
        let store = Arc::new(MemoryEnrollmentStore::with_students(students));
        let notifier = Arc::new(ChannelNotifier::new(&config.notifications));
        let events = notifier.subscribe();
        let clock = Arc::new(FixedClock::new(now()));
        let mut ctx = EngineContext::new(config, snapshot, store.clone())
            .with_notifier(notifier)
            .with_clock(clock.clone());
        if let Some(provider) = provider {
            ctx = ctx.with_provider(provider);
        }
        Self {
            engine: Engine::new(ctx),
            store,
            events,
            clock,
        }
    }

    /// Load a student from the store
    pub async fn student(&self, id: u64) -> Student {
        self.store
            .find_student(StudentId::new(id))
            .await
            .unwrap()
            .expect("student exists")
    }

    /// Sections a request is enrolled in
    pub async fn sections_of(&self, student: u64, request: u64) -> Option<Vec<u64>> {
        self.student(student)
            .await
            .course_request(RequestId::new(request))
            .and_then(|r| r.enrollment.as_ref())
            .map(|e| e.sections.iter().map(|s| s.0).collect())
    }

    /// Number of enrollment records in an offering
    pub async fn enrollment_count(&self, offering: u64) -> usize {
        self.store
            .offering_enrollments(OfferingId::new(offering))
            .await
            .unwrap()
            .records
            .len()
    }

    /// Drain every event published so far
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// A student without requests
pub fn student(id: u64) -> Student {
    Student {
        id: StudentId::new(id),
        external_id: format!("{id:07}"),
        name: format!("Student {id}"),
        status: None,
        priority: StudentPriority::Normal,
        groups: Default::default(),
        requests: Vec::new(),
    }
}

/// Add a course request to a student
pub fn with_request(mut student: Student, request: CourseRequest) -> Student {
    student.requests.push(Request::Course(request));
    student
}

/// A course request for the courses, best first
pub fn request(id: u64, priority: u32, courses: &[u64]) -> CourseRequest {
    CourseRequest {
        id: RequestId::new(id),
        priority,
        alternative: false,
        courses: courses.iter().copied().map(CourseId::new).collect(),
        wait_list: false,
        no_sub: false,
        criticality: Default::default(),
        overrides: Default::default(),
        enrollment: None,
        timestamp: now() - Duration::days(30),
        wait_listed_at: None,
        swap_with: None,
    }
}

/// A wait-listed course request, queued `minutes_ago` before now
pub fn wait_listed(id: u64, priority: u32, courses: &[u64], minutes_ago: i64) -> CourseRequest {
    let mut request = request(id, priority, courses);
    request.wait_list = true;
    request.wait_listed_at = Some(now() - Duration::minutes(minutes_ago));
    request
}

/// A committed enrollment
pub fn enrollment(offering: u64, course: u64, config: u64, sections: &[u64]) -> Enrollment {
    Enrollment {
        offering_id: OfferingId::new(offering),
        course_id: CourseId::new(course),
        config_id: ConfigId::new(config),
        sections: sections.iter().copied().map(SectionId::new).collect(),
        reservation_id: None,
        approval: None,
        timestamp: now() - Duration::days(20),
    }
}

/// A request already enrolled
pub fn enrolled(mut request: CourseRequest, enrollment: Enrollment) -> CourseRequest {
    request.enrollment = Some(enrollment);
    request
}

/// A student enrolled in MATH 101 with the given recitation
pub fn math_student(id: u64, recitation: u64) -> Student {
    with_request(
        student(id),
        enrolled(request(1, 0, &[MATH]), enrollment(1, MATH, 1, &[10, recitation])),
    )
}

/// Section assignments of one course
pub fn assign(course: u64, sections: &[u64]) -> Vec<ClassAssignment> {
    sections
        .iter()
        .map(|s| ClassAssignment::Section {
            course_id: CourseId::new(course),
            section_id: SectionId::new(*s),
            time: None,
        })
        .collect()
}

/// Provider rejecting every change for one student
#[derive(Debug)]
pub struct RejectingProvider {
    /// The student whose changes are rejected
    pub student: StudentId,
}

#[async_trait]
impl EnrollmentProvider for RejectingProvider {
    async fn resection(
        &self,
        _offering: &Offering,
        student: &Student,
        candidate: &Enrollment,
    ) -> AppResult<Enrollment> {
        if student.id == self.student {
            return Err(AppError::provider("registrar rejected the change"));
        }
        Ok(candidate.clone())
    }
}
