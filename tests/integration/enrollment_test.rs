//! Integration tests for interactive enrollment.

use chrono::Duration;

use sectioning_core::error::ErrorKind;
use sectioning_core::events::EventPayload;
use sectioning_core::events::enrollment::EnrollmentEvent;
use sectioning_core::types::id::{OfferingId, SectionId, StudentId};
use sectioning_core::types::outcome::WaitListType;
use sectioning_engine::{EnrollmentStore, ValidationError, ViolationCode};
use sectioning_entity::student::Student;

use crate::helpers::{
    self, CHEM, MATH, TestApp, assign, enrolled, enrollment, math_student, request, student,
    wait_listed, with_request,
};

fn chem_student(id: u64, section: u64) -> Student {
    with_request(
        student(id),
        enrolled(request(1, 0, &[CHEM]), enrollment(2, CHEM, 2, &[section])),
    )
}

#[tokio::test]
async fn test_enroll_commits_and_clears_wait_list() {
    let mut app = TestApp::new(vec![with_request(student(1), wait_listed(1, 0, &[CHEM], 15))]);

    let outcome = app
        .engine
        .enroll(StudentId::new(1), &assign(CHEM, &[21]))
        .await
        .unwrap();

    assert!(outcome.freed_offerings.is_empty());
    assert_eq!(app.sections_of(1, 1).await, Some(vec![21]));
    let request = outcome.student.course_requests().next().unwrap().clone();
    assert!(!request.wait_list);
    assert!(request.wait_listed_at.is_none());

    let audit = app.store.audit_log(Some(StudentId::new(1))).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "enroll");
    assert_eq!(audit[0].wait_list_type, Some(WaitListType::Sectioning));
    assert_eq!(app.store.expected_space(SectionId::new(21)).await.unwrap(), 1);

    let events = app.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0].payload,
        EventPayload::Enrollment(EnrollmentEvent::Changed { .. })
    ));
}

#[tokio::test]
async fn test_section_change_frees_the_old_section() {
    let app = TestApp::new(vec![math_student(1, 11)]);

    let outcome = app
        .engine
        .enroll(StudentId::new(1), &assign(MATH, &[10, 12]))
        .await
        .unwrap();

    assert_eq!(outcome.freed_offerings, vec![OfferingId::new(MATH)]);
    assert_eq!(app.sections_of(1, 1).await, Some(vec![10, 12]));
    assert_eq!(app.store.expected_space(SectionId::new(11)).await.unwrap(), -1);
    assert_eq!(app.store.expected_space(SectionId::new(12)).await.unwrap(), 1);
    assert_eq!(app.store.expected_space(SectionId::new(10)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unchanged_schedule_writes_no_audit() {
    let app = TestApp::new(vec![math_student(1, 11)]);

    let outcome = app
        .engine
        .enroll(StudentId::new(1), &assign(MATH, &[11, 10]))
        .await
        .unwrap();

    assert!(outcome.freed_offerings.is_empty());
    assert!(app.store.audit_log(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_schedule_drops_enrolled_courses() {
    let mut app = TestApp::new(vec![chem_student(1, 21)]);

    let outcome = app.engine.enroll(StudentId::new(1), &[]).await.unwrap();

    assert_eq!(outcome.freed_offerings, vec![OfferingId::new(CHEM)]);
    assert_eq!(outcome.grouping.dropped.len(), 1);
    assert_eq!(app.sections_of(1, 1).await, None);
    assert_eq!(app.enrollment_count(CHEM).await, 0);

    let audit = app.store.audit_log(Some(StudentId::new(1))).await.unwrap();
    assert_eq!(audit[0].action, "drop");
    assert_eq!(audit[0].before.as_deref(), Some("CHEM 110: Lec 2"));
    assert!(app.drain_events().iter().any(|e| matches!(
        e.payload,
        EventPayload::Enrollment(EnrollmentEvent::Dropped { .. })
    )));
}

#[tokio::test]
async fn test_rejected_schedule_leaves_store_untouched() {
    let app = TestApp::new(vec![
        chem_student(101, 21),
        chem_student(102, 21),
        with_request(student(1), request(1, 0, &[CHEM])),
    ]);

    let err = app
        .engine
        .enroll(StudentId::new(1), &assign(CHEM, &[21]))
        .await
        .unwrap_err();

    assert!(matches!(err, ValidationError::Rejected(_)));
    assert!(err.has_code(ViolationCode::NotAvailable));
    assert_eq!(app.sections_of(1, 1).await, None);
    assert_eq!(app.enrollment_count(CHEM).await, 2);
    assert!(app.store.audit_log(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unrequested_course_cannot_be_enrolled() {
    let app = TestApp::new(vec![with_request(student(1), request(1, 0, &[CHEM]))]);

    let err = app
        .engine
        .enroll(StudentId::new(1), &assign(MATH, &[10, 11]))
        .await
        .unwrap_err();

    match err {
        ValidationError::App(e) => assert_eq!(e.kind, ErrorKind::NotFound),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_drop_refused_once_the_deadline_passes() {
    let mut config = helpers::config();
    config.deadlines.default.drop_end = Some(helpers::now() + Duration::days(1));
    let app = TestApp::build(config, helpers::catalog(), vec![chem_student(1, 21)], None);

    app.clock.set(helpers::now() + Duration::days(2));
    let err = app.engine.enroll(StudentId::new(1), &[]).await.unwrap_err();
    assert!(err.has_code(ViolationCode::Deadline));
    assert_eq!(app.sections_of(1, 1).await, Some(vec![21]));

    app.clock.set(helpers::now());
    app.engine.enroll(StudentId::new(1), &[]).await.unwrap();
    assert_eq!(app.sections_of(1, 1).await, None);
}
