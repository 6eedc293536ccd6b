//! End-to-end registration scenarios.

use sectioning_core::types::id::{OfferingId, SectionId, StudentId};
use sectioning_core::types::outcome::ResultType;
use sectioning_engine::resection::ReschedulingReason;
use sectioning_engine::{EnrollmentStore, ValidationMode, ViolationCode};
use sectioning_entity::student::{Student, StudentPriority};

use crate::helpers::{
    self, CHEM, MATH, TestApp, assign, enrolled, enrollment, math_student, request, student,
    wait_listed, with_request,
};

/// Thirty students filling MATH 101, split over both recitations.
fn full_lecture() -> Vec<Student> {
    (101..=130)
        .map(|id| math_student(id, if id % 2 == 0 { 11 } else { 12 }))
        .collect()
}

#[tokio::test]
async fn test_full_lecture_then_withdrawal_seats_priority_student() {
    let mut students = full_lecture();
    students.push(with_request(student(1), wait_listed(1, 0, &[MATH], 90)));
    students.push(with_request(student(2), wait_listed(1, 0, &[MATH], 60)));
    let mut priority = with_request(student(3), wait_listed(1, 0, &[MATH], 5));
    priority.priority = StudentPriority::Priority;
    students.push(priority);
    let app = TestApp::new(students);

    let err = app
        .engine
        .validate(StudentId::new(1), &assign(MATH, &[10, 11]), ValidationMode::FailFast)
        .await
        .unwrap_err();
    assert!(err.has_code(ViolationCode::NotAvailable));
    assert_eq!(err.violations()[0].section, Some(SectionId::new(10)));

    let nothing = app
        .engine
        .recheck_report(&[OfferingId::new(MATH)], None, None)
        .await
        .unwrap();
    assert_eq!(nothing.changed(), 0);

    let withdrawal = app.engine.enroll(StudentId::new(101), &[]).await.unwrap();
    assert_eq!(withdrawal.freed_offerings, vec![OfferingId::new(MATH)]);

    let report = app
        .engine
        .recheck_report(&withdrawal.freed_offerings, None, None)
        .await
        .unwrap();

    assert_eq!(report.changed(), 1);
    assert!(app.sections_of(3, 1).await.is_some());
    assert_eq!(app.sections_of(1, 1).await, None);
    assert_eq!(app.sections_of(2, 1).await, None);
    assert_eq!(app.enrollment_count(MATH).await, 30);

    let seated: Vec<_> = app
        .store
        .audit_log(None)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.action == "resection" && e.result == ResultType::True)
        .collect();
    assert_eq!(seated.len(), 1);
    assert_eq!(seated[0].student_id, StudentId::new(3));
}

#[tokio::test]
async fn test_orphaned_recitation_is_repaired() {
    let orphan = with_request(
        student(1),
        enrolled(request(1, 0, &[MATH]), enrollment(1, MATH, 1, &[11])),
    );
    let app = TestApp::new(vec![orphan]);

    let report = app
        .engine
        .recheck_report(&[OfferingId::new(MATH)], None, None)
        .await
        .unwrap();

    let outcomes = report.for_student(StudentId::new(1));
    let outcome = outcomes[0];
    assert_eq!(outcome.result, ResultType::True);
    assert_eq!(outcome.reason, Some(ReschedulingReason::MissingClass));
    let sections = app.sections_of(1, 1).await.unwrap();
    assert_eq!(sections.len(), 2);
    assert!(sections.contains(&10));

    let audit = app.store.audit_log(Some(StudentId::new(1))).await.unwrap();
    assert_eq!(audit[0].message.as_deref(), Some("MISSING_CLASS"));
}

#[tokio::test]
async fn test_unrepairable_enrollment_is_wait_listed() {
    let mut students = full_lecture();
    students.push(with_request(
        student(1),
        enrolled(request(1, 0, &[MATH]), enrollment(1, MATH, 1, &[11])),
    ));
    let app = TestApp::new(students);

    let report = app
        .engine
        .recheck_report(&[OfferingId::new(MATH)], None, None)
        .await
        .unwrap();

    let outcomes = report.for_student(StudentId::new(1));
    let outcome = outcomes[0];
    assert_eq!(outcome.result, ResultType::Null);
    let student = app.student(1).await;
    let request = student.course_requests().next().unwrap();
    assert!(request.enrollment.is_none());
    assert!(request.wait_list);
    assert_eq!(request.wait_listed_at, Some(helpers::now()));
    assert_eq!(app.store.expected_space(SectionId::new(11)).await.unwrap(), -1);
}

#[tokio::test]
async fn test_catalog_growth_reaches_wait_list() {
    let fillers: Vec<Student> = [(101, 20), (102, 20), (103, 21), (104, 21)]
        .into_iter()
        .map(|(id, section)| {
            with_request(
                student(id),
                enrolled(request(1, 0, &[CHEM]), enrollment(2, CHEM, 2, &[section])),
            )
        })
        .collect();
    let mut students = fillers;
    students.push(with_request(student(1), wait_listed(1, 0, &[CHEM], 30)));
    let app = TestApp::new(students);

    assert!(
        app.engine
            .recheck_offerings(&[OfferingId::new(CHEM)], None, None)
            .await
            .unwrap()
    );
    assert_eq!(app.sections_of(1, 1).await, None);

    let mut data = helpers::catalog();
    data.sections
        .iter_mut()
        .filter(|s| s.id == SectionId::new(21))
        .for_each(|s| s.limit = 3);
    let changed = app.engine.refresh_catalog(data).await.unwrap();
    assert_eq!(changed, vec![OfferingId::new(CHEM)]);

    app.engine.recheck_offerings(&changed, None, None).await.unwrap();
    assert_eq!(app.sections_of(1, 1).await, Some(vec![21]));
}
