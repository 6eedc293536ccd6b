//! Integration tests for schedule validation.

use chrono::Duration;
use serde_json::json;

use sectioning_core::error::ErrorKind;
use sectioning_core::types::id::{ConfigId, OfferingId, ReservationId, SectionId, StudentId};
use sectioning_engine::quota::CapacityLevel;
use sectioning_engine::{ValidationError, ValidationMode, ViolationCode};
use sectioning_entity::offering::{Distribution, DistributionKind, TimeLocation};
use sectioning_entity::student::Student;

use crate::helpers::{
    self, CHEM, MATH, TestApp, assign, enrolled, enrollment, math_student, request, student,
    with_request,
};

fn chem_student(id: u64, section: u64) -> Student {
    with_request(
        student(id),
        enrolled(request(1, 0, &[CHEM]), enrollment(2, CHEM, 2, &[section])),
    )
}

fn math_and_chem(id: u64) -> Student {
    with_request(
        with_request(student(id), request(1, 0, &[MATH])),
        request(2, 1, &[CHEM]),
    )
}

#[tokio::test]
async fn test_valid_selection_is_grouped_per_course() {
    let app = TestApp::new(vec![math_and_chem(1)]);
    let mut candidate = assign(MATH, &[10, 11]);
    candidate.extend(assign(CHEM, &[21]));

    let grouping = app
        .engine
        .validate(StudentId::new(1), &candidate, ValidationMode::FailFast)
        .await
        .unwrap();

    assert_eq!(grouping.requests.len(), 2);
    assert_eq!(grouping.requests[0].config_id, ConfigId::new(1));
    assert_eq!(
        grouping.requests[0].sections,
        vec![SectionId::new(10), SectionId::new(11)]
    );
    assert_eq!(grouping.requests[1].sections, vec![SectionId::new(21)]);
    assert!(grouping.dropped.is_empty());
}

#[tokio::test]
async fn test_unknown_section_is_fatal() {
    let app = TestApp::new(vec![math_and_chem(1)]);
    for mode in [ValidationMode::FailFast, ValidationMode::CollectErrors] {
        let err = app
            .engine
            .validate(StudentId::new(1), &assign(MATH, &[10, 99]), mode)
            .await
            .unwrap_err();
        match err {
            ValidationError::App(e) => assert_eq!(e.kind, ErrorKind::NotFound),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_unrequested_course_is_not_found() {
    let app = TestApp::new(vec![with_request(student(1), request(1, 0, &[CHEM]))]);
    let err = app
        .engine
        .validate(StudentId::new(1), &assign(MATH, &[10, 11]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::App(ref e) if e.kind == ErrorKind::NotFound));
}

#[tokio::test]
async fn test_unknown_student_is_not_found() {
    let app = TestApp::new(vec![]);
    let err = app
        .engine
        .validate(StudentId::new(42), &assign(CHEM, &[21]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::App(ref e) if e.kind == ErrorKind::NotFound));
}

#[tokio::test]
async fn test_incomplete_and_extra_sections_are_structure_errors() {
    let app = TestApp::new(vec![math_and_chem(1)]);

    let missing = app
        .engine
        .validate(StudentId::new(1), &assign(MATH, &[10]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(missing.has_code(ViolationCode::Structure));

    let extra = app
        .engine
        .validate(StudentId::new(1), &assign(MATH, &[10, 11, 12]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(extra.has_code(ViolationCode::Structure));
}

#[tokio::test]
async fn test_cross_course_overlap_is_time_conflict() {
    let app = TestApp::new(vec![math_and_chem(1)]);
    let mut candidate = assign(MATH, &[10, 11]);
    candidate.extend(assign(CHEM, &[20]));

    let err = app
        .engine
        .validate(StudentId::new(1), &candidate, ValidationMode::FailFast)
        .await
        .unwrap_err();

    assert_eq!(err.violations().len(), 1);
    assert_eq!(err.violations()[0].code, ViolationCode::TimeConflict);
    assert_eq!(err.violations()[0].section, Some(SectionId::new(20)));
}

#[tokio::test]
async fn test_collect_mode_reports_every_violation() {
    let app = TestApp::new(vec![math_and_chem(1)]);
    let mut candidate = assign(MATH, &[10]);
    candidate.extend(assign(CHEM, &[20]));

    let fail_fast = app
        .engine
        .validate(StudentId::new(1), &candidate, ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert_eq!(fail_fast.violations().len(), 1);
    assert_eq!(fail_fast.violations()[0].code, ViolationCode::Structure);

    let collected = app
        .engine
        .validate(StudentId::new(1), &candidate, ValidationMode::CollectErrors)
        .await
        .unwrap_err();
    assert!(collected.has_code(ViolationCode::Structure));
    assert!(collected.has_code(ViolationCode::TimeConflict));
    assert!(collected.violations().len() >= 2);
}

#[tokio::test]
async fn test_full_section_is_not_available() {
    let app = TestApp::new(vec![
        chem_student(101, 20),
        chem_student(102, 20),
        with_request(student(1), request(1, 0, &[CHEM])),
    ]);

    let err = app
        .engine
        .validate(StudentId::new(1), &assign(CHEM, &[20]), ValidationMode::FailFast)
        .await
        .unwrap_err();

    let violation = &err.violations()[0];
    assert_eq!(violation.code, ViolationCode::NotAvailable);
    assert_eq!(violation.section, Some(SectionId::new(20)));
    assert_eq!(violation.level, Some(CapacityLevel::Section));

    let grouping = app
        .engine
        .validate(StudentId::new(1), &assign(CHEM, &[21]), ValidationMode::FailFast)
        .await
        .unwrap();
    assert_eq!(grouping.requests[0].sections, vec![SectionId::new(21)]);
}

#[tokio::test]
async fn test_revalidating_own_enrollment_is_clean() {
    // The lecture is full, but one of the seats is the student's own.
    let mut students: Vec<_> = (101..130)
        .map(|id| math_student(id, if id % 2 == 0 { 11 } else { 12 }))
        .collect();
    students.push(math_student(1, 12));
    let app = TestApp::new(students);

    let grouping = app
        .engine
        .validate(StudentId::new(1), &assign(MATH, &[10, 12]), ValidationMode::CollectErrors)
        .await
        .unwrap();
    assert_eq!(grouping.requests.len(), 1);
    assert!(grouping.dropped.is_empty());
}

#[tokio::test]
async fn test_cancelled_section_depends_on_policy() {
    let mut data = helpers::catalog();
    data.sections
        .iter_mut()
        .filter(|s| s.id == SectionId::new(21))
        .for_each(|s| s.cancelled = true);
    let students = vec![chem_student(1, 21), with_request(student(2), request(1, 0, &[CHEM]))];

    let strict = TestApp::build(helpers::config(), data.clone(), students.clone(), None);
    let err = strict
        .engine
        .validate(StudentId::new(1), &assign(CHEM, &[21]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(err.has_code(ViolationCode::Cancel));

    let mut config = helpers::config();
    config.policy.allow_keep_cancelled = true;
    let lenient = TestApp::build(config, data, students, None);
    lenient
        .engine
        .validate(StudentId::new(1), &assign(CHEM, &[21]), ValidationMode::FailFast)
        .await
        .unwrap();
    let err = lenient
        .engine
        .validate(StudentId::new(2), &assign(CHEM, &[21]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(err.has_code(ViolationCode::Cancel));
}

#[tokio::test]
async fn test_passed_deadlines_are_reported() {
    let mut config = helpers::config();
    config.deadlines.default.new_end = Some(helpers::now() - Duration::days(1));
    config.deadlines.default.drop_end = Some(helpers::now() - Duration::days(1));
    let app = TestApp::build(
        config,
        helpers::catalog(),
        vec![
            with_request(chem_student(1, 21), request(2, 1, &[MATH])),
        ],
        None,
    );

    let mut candidate = assign(CHEM, &[21]);
    candidate.extend(assign(MATH, &[10, 11]));
    let err = app
        .engine
        .validate(StudentId::new(1), &candidate, ValidationMode::CollectErrors)
        .await
        .unwrap_err();
    let deadlines: Vec<_> = err
        .violations()
        .iter()
        .filter(|v| v.code == ViolationCode::Deadline)
        .collect();
    // Two new MATH sections; the kept CHEM section is not re-checked.
    assert_eq!(deadlines.len(), 2);

    let err = app
        .engine
        .validate(StudentId::new(1), &[], ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(err.has_code(ViolationCode::Deadline));
}

#[tokio::test]
async fn test_reservation_holds_space_for_its_group() {
    let mut data = helpers::catalog();
    data.reservations.push(
        serde_json::from_value(json!({
            "id": 1, "offering_id": 2, "limit": 1, "configs": [2],
            "scope": { "type": "group", "group": "honors" }
        }))
        .unwrap(),
    );
    data.offerings
        .iter_mut()
        .filter(|o| o.id == OfferingId::new(2))
        .for_each(|o| o.reservations.push(ReservationId::new(1)));

    let mut honors = with_request(student(1), request(1, 0, &[CHEM]));
    honors.groups.insert("honors".to_string());
    let regular = with_request(student(2), request(1, 0, &[CHEM]));
    let app = TestApp::build(
        helpers::config(),
        data,
        vec![chem_student(101, 20), honors, regular],
        None,
    );

    let err = app
        .engine
        .validate(StudentId::new(2), &assign(CHEM, &[20]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(err.has_code(ViolationCode::NotAvailable));

    let grouping = app
        .engine
        .validate(StudentId::new(1), &assign(CHEM, &[20]), ValidationMode::FailFast)
        .await
        .unwrap();
    assert_eq!(grouping.requests[0].reservation_id, Some(ReservationId::new(1)));
}

#[tokio::test]
async fn test_reservation_holder_takes_last_seat() {
    let mut data = helpers::catalog();
    data.reservations.push(
        serde_json::from_value(json!({
            "id": 1, "offering_id": 2, "limit": 1,
            "scope": { "type": "group", "group": "honors" }
        }))
        .unwrap(),
    );
    data.offerings
        .iter_mut()
        .filter(|o| o.id == OfferingId::new(2))
        .for_each(|o| o.reservations.push(ReservationId::new(1)));

    let mut honors = with_request(student(1), request(1, 0, &[CHEM]));
    honors.groups.insert("honors".to_string());
    let regular = with_request(student(2), request(1, 0, &[CHEM]));
    let app = TestApp::build(
        helpers::config(),
        data,
        vec![chem_student(101, 20), chem_student(102, 20), honors, regular],
        None,
    );

    let err = app
        .engine
        .validate(StudentId::new(2), &assign(CHEM, &[20]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(err.has_code(ViolationCode::NotAvailable));

    let grouping = app
        .engine
        .validate(StudentId::new(1), &assign(CHEM, &[20]), ValidationMode::FailFast)
        .await
        .unwrap();
    assert_eq!(grouping.requests[0].reservation_id, Some(ReservationId::new(1)));
}

#[tokio::test]
async fn test_config_allowing_overlap_skips_cross_course_conflict() {
    let mut data = helpers::catalog();
    data.configs
        .iter_mut()
        .filter(|c| c.id == ConfigId::new(2))
        .for_each(|c| c.allow_overlap = true);
    let app = TestApp::build(helpers::config(), data, vec![math_and_chem(1)], None);
    let mut candidate = assign(MATH, &[10, 11]);
    candidate.extend(assign(CHEM, &[20]));

    let grouping = app
        .engine
        .validate(StudentId::new(1), &candidate, ValidationMode::FailFast)
        .await
        .unwrap();
    assert_eq!(grouping.requests.len(), 2);
}

#[tokio::test]
async fn test_allow_overlap_distribution_exempts_sections() {
    let mut data = helpers::catalog();
    // Rec 1 moved onto the lecture's meeting time.
    data.sections
        .iter_mut()
        .filter(|s| s.id == SectionId::new(11))
        .for_each(|s| s.time = Some(TimeLocation::new(21, 108, 12)));
    let app = TestApp::build(
        helpers::config(),
        data.clone(),
        vec![with_request(student(1), request(1, 0, &[MATH]))],
        None,
    );
    let err = app
        .engine
        .validate(StudentId::new(1), &assign(MATH, &[10, 11]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(err.has_code(ViolationCode::TimeConflict));

    data.offerings
        .iter_mut()
        .filter(|o| o.id == OfferingId::new(1))
        .for_each(|o| {
            o.distributions.push(Distribution {
                kind: DistributionKind::AllowOverlap,
                sections: vec![SectionId::new(10), SectionId::new(11)],
            })
        });
    let app = TestApp::build(
        helpers::config(),
        data,
        vec![with_request(student(1), request(1, 0, &[MATH]))],
        None,
    );
    assert!(
        app.engine
            .validate(StudentId::new(1), &assign(MATH, &[10, 11]), ValidationMode::FailFast)
            .await
            .is_ok()
    );
}
