//! Integration tests for wait-list and disrupted-enrollment resectioning.

use std::collections::BTreeSet;
use std::sync::Arc;

use sectioning_core::config::{QueueOrder, WaitListMode};
use sectioning_core::events::EventPayload;
use sectioning_core::events::enrollment::EnrollmentEvent;
use sectioning_core::events::offering::OfferingEvent;
use sectioning_core::types::id::{CourseId, OfferingId, StudentId};
use sectioning_core::types::outcome::{ResultType, WaitListType};
use sectioning_engine::EnrollmentStore;
use sectioning_entity::student::{Student, StudentPriority};

use crate::helpers::{
    self, ASTR, CHEM, MATH, PHYS, RejectingProvider, TestApp, enrolled, enrollment, request,
    student, wait_listed, with_request,
};

fn chem_filler(id: u64, section: u64) -> Student {
    with_request(
        student(id),
        enrolled(request(1, 0, &[CHEM]), enrollment(2, CHEM, 2, &[section])),
    )
}

fn offerings(ids: &[u64]) -> Vec<OfferingId> {
    ids.iter().copied().map(OfferingId::new).collect()
}

#[tokio::test]
async fn test_wait_listed_student_gets_open_section() {
    let app = TestApp::new(vec![
        chem_filler(101, 20),
        chem_filler(102, 20),
        with_request(student(1), wait_listed(1, 0, &[CHEM], 30)),
    ]);

    let ok = app
        .engine
        .recheck_offerings(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(app.sections_of(1, 1).await, Some(vec![21]));
    let student = app.student(1).await;
    let request = student.course_requests().next().unwrap();
    assert!(!request.wait_list);
    assert!(request.wait_listed_at.is_none());
    assert_eq!(app.enrollment_count(2).await, 3);

    let audit = app.store.audit_log(Some(StudentId::new(1))).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].result, ResultType::True);
    assert_eq!(audit[0].wait_list_type, Some(WaitListType::WaitListProcessing));
    assert_eq!(audit[0].after.as_deref(), Some("CHEM 110: Lec 2"));
}

#[tokio::test]
async fn test_conflicting_section_is_never_chosen() {
    let conflicted = with_request(
        with_request(
            student(1),
            enrolled(request(1, 0, &[MATH]), enrollment(1, MATH, 1, &[10, 11])),
        ),
        wait_listed(2, 1, &[CHEM], 30),
    );
    let app = TestApp::new(vec![chem_filler(101, 21), chem_filler(102, 21), conflicted]);

    let report = app
        .engine
        .recheck_report(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    let outcomes = report.for_student(StudentId::new(1));
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result, ResultType::False);
    assert_eq!(app.sections_of(1, 2).await, None);
    assert!(app.store.audit_log(Some(StudentId::new(1))).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upgrade_moves_to_better_choice_and_frees_old_seat() {
    let mut upgrading = wait_listed(1, 0, &[CHEM, MATH], 30);
    upgrading.enrollment = Some(enrollment(1, MATH, 1, &[10, 11]));
    let app = TestApp::new(vec![with_request(student(1), upgrading)]);

    let report = app
        .engine
        .recheck_report(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    assert_eq!(report.processed, offerings(&[CHEM, MATH]));
    let student = app.student(1).await;
    let request = student.course_requests().next().unwrap();
    let enrollment = request.enrollment.as_ref().unwrap();
    assert_eq!(enrollment.course_id, CourseId::new(CHEM));
    assert!(!request.wait_list);
    assert_eq!(app.enrollment_count(1).await, 0);
    assert_eq!(app.enrollment_count(2).await, 1);
}

#[tokio::test]
async fn test_swap_drops_the_replaced_course_and_cascades() {
    let mut swapping = wait_listed(2, 1, &[CHEM], 30);
    swapping.swap_with = Some(CourseId::new(PHYS));
    let holder = with_request(
        with_request(
            student(400),
            enrolled(request(1, 3, &[PHYS]), enrollment(3, PHYS, 3, &[30])),
        ),
        swapping,
    );
    let waiting = with_request(student(401), wait_listed(1, 0, &[PHYS], 10));
    let mut app = TestApp::new(vec![holder, waiting]);

    let ok = app
        .engine
        .recheck_offerings(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();
    assert!(ok);

    let holder = app.student(400).await;
    let dropped = holder.course_requests().find(|r| r.id.0 == 1).unwrap();
    assert!(dropped.enrollment.is_none());
    assert_eq!(dropped.priority, 0);
    assert!(!dropped.wait_list);
    let swapped = holder.course_requests().find(|r| r.id.0 == 2).unwrap();
    assert_eq!(swapped.enrollment.as_ref().unwrap().course_id, CourseId::new(CHEM));
    assert!(swapped.swap_with.is_none());

    assert_eq!(app.sections_of(401, 1).await, Some(vec![30]));

    let audit = app.store.audit_log(Some(StudentId::new(400))).await.unwrap();
    let actions: Vec<_> = audit.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["resection", "swap-drop"]);

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::Enrollment(EnrollmentEvent::Dropped { student_id, .. })
            if *student_id == StudentId::new(400)
    )));
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::Offering(OfferingEvent::SpaceReleased { offering_id })
            if *offering_id == OfferingId::new(PHYS)
    )));
}

#[tokio::test]
async fn test_provider_failure_keeps_existing_enrollment() {
    let mut swapping = wait_listed(2, 1, &[CHEM], 30);
    swapping.swap_with = Some(CourseId::new(PHYS));
    let holder = with_request(
        with_request(
            student(400),
            enrolled(request(1, 3, &[PHYS]), enrollment(3, PHYS, 3, &[30])),
        ),
        swapping,
    );
    let app = TestApp::with_provider(
        vec![holder],
        Arc::new(RejectingProvider {
            student: StudentId::new(400),
        }),
    );

    let ok = app
        .engine
        .recheck_offerings(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    assert!(!ok);
    assert_eq!(app.sections_of(400, 1).await, Some(vec![30]));
    assert_eq!(app.sections_of(400, 2).await, None);
    let audit = app.store.audit_log(Some(StudentId::new(400))).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].result, ResultType::Failure);
    assert_eq!(audit[0].message.as_deref(), Some("registrar rejected the change"));
}

#[tokio::test]
async fn test_queue_order_decides_the_last_seat() {
    let early = with_request(student(1), wait_listed(1, 0, &[PHYS], 60));
    let mut late = with_request(student(2), wait_listed(1, 0, &[PHYS], 5));
    late.priority = StudentPriority::Priority;

    let by_priority = TestApp::new(vec![early.clone(), late.clone()]);
    by_priority
        .engine
        .recheck_offerings(&offerings(&[PHYS]), None, None)
        .await
        .unwrap();
    assert_eq!(by_priority.sections_of(2, 1).await, Some(vec![30]));
    assert_eq!(by_priority.sections_of(1, 1).await, None);

    let mut config = helpers::config();
    config.search.queue_order = QueueOrder::FirstComeFirstServed;
    let by_time = TestApp::build(config, helpers::catalog(), vec![early, late], None);
    by_time
        .engine
        .recheck_offerings(&offerings(&[PHYS]), None, None)
        .await
        .unwrap();
    assert_eq!(by_time.sections_of(1, 1).await, Some(vec![30]));
    assert_eq!(by_time.sections_of(2, 1).await, None);
}

#[tokio::test]
async fn test_cross_listed_course_keeps_requested_name() {
    let app = TestApp::new(vec![with_request(student(1), wait_listed(1, 0, &[ASTR], 5))]);

    app.engine
        .recheck_offerings(&offerings(&[PHYS]), None, None)
        .await
        .unwrap();

    let student = app.student(1).await;
    let enrollment = student
        .course_requests()
        .next()
        .and_then(|r| r.enrollment.clone())
        .unwrap();
    assert_eq!(enrollment.offering_id, OfferingId::new(PHYS));
    assert_eq!(enrollment.course_id, CourseId::new(ASTR));
}

#[tokio::test]
async fn test_skip_and_only_filter_students() {
    let students = vec![
        with_request(student(1), wait_listed(1, 0, &[CHEM], 30)),
        with_request(student(2), wait_listed(1, 0, &[CHEM], 20)),
    ];

    let skipping = TestApp::new(students.clone());
    let skip = BTreeSet::from([StudentId::new(1)]);
    skipping
        .engine
        .recheck_offerings(&offerings(&[CHEM]), Some(&skip), None)
        .await
        .unwrap();
    assert_eq!(skipping.sections_of(1, 1).await, None);
    assert!(skipping.sections_of(2, 1).await.is_some());

    let restricted = TestApp::new(students);
    let only = BTreeSet::from([StudentId::new(1)]);
    restricted
        .engine
        .recheck_offerings(&offerings(&[CHEM]), None, Some(&only))
        .await
        .unwrap();
    assert!(restricted.sections_of(1, 1).await.is_some());
    assert_eq!(restricted.sections_of(2, 1).await, None);
}

#[tokio::test]
async fn test_offering_without_wait_list_is_skipped() {
    let mut data = helpers::catalog();
    data.offerings
        .iter_mut()
        .filter(|o| o.id == OfferingId::new(CHEM))
        .for_each(|o| o.wait_list = false);
    let app = TestApp::build(
        helpers::config(),
        data,
        vec![with_request(student(1), wait_listed(1, 0, &[CHEM], 30))],
        None,
    );

    let report = app
        .engine
        .recheck_report(&offerings(&[CHEM, 99]), None, None)
        .await
        .unwrap();

    assert_eq!(report.skipped, offerings(&[CHEM, 99]));
    assert!(report.processed.is_empty());
    assert_eq!(app.sections_of(1, 1).await, None);
}

#[tokio::test]
async fn test_broken_enrollment_left_alone_without_reschedule() {
    let broken = with_request(
        student(1),
        enrolled(request(1, 0, &[CHEM]), enrollment(2, CHEM, 2, &[20, 21])),
    );
    let app = TestApp::new(vec![broken]);

    let report = app
        .engine
        .recheck_report(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    assert_eq!(report.processed, offerings(&[CHEM]));
    assert!(report.outcomes.is_empty());
    assert_eq!(app.sections_of(1, 1).await, Some(vec![20, 21]));
}

#[tokio::test]
async fn test_recheck_publishes_change_and_summary() {
    let mut app = TestApp::new(vec![with_request(student(1), wait_listed(1, 0, &[CHEM], 30))]);

    app.engine
        .recheck_offerings(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::Enrollment(EnrollmentEvent::Changed { student_id, result, old_course, .. })
            if *student_id == StudentId::new(1) && *result == ResultType::True && old_course.is_none()
    )));
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::Offering(OfferingEvent::Rechecked { offering_id, candidates: 1, changed: 1, failed: 0 })
            if *offering_id == OfferingId::new(CHEM)
    )));
}

#[tokio::test]
async fn test_no_subs_mode_holds_only_no_sub_requests() {
    let mut config = helpers::config();
    config
        .waitlist
        .by_status
        .insert("grad".to_string(), WaitListMode::NoSubs);

    let mut flagged = with_request(student(1), wait_listed(1, 0, &[CHEM], 30));
    flagged.status = Some("grad".to_string());
    let mut no_sub = request(1, 0, &[CHEM]);
    no_sub.no_sub = true;
    let mut holder = with_request(student(2), no_sub);
    holder.status = Some("grad".to_string());

    let app = TestApp::build(
        config,
        helpers::catalog(),
        vec![chem_filler(101, 20), chem_filler(102, 20), flagged, holder],
        None,
    );
    let report = app
        .engine
        .recheck_report(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    assert!(report.for_student(StudentId::new(1)).is_empty());
    assert_eq!(app.sections_of(1, 1).await, None);
    assert_eq!(app.sections_of(2, 1).await, Some(vec![21]));
}

#[tokio::test]
async fn test_disabled_wait_list_mode_seats_nobody() {
    let mut config = helpers::config();
    config.waitlist.default_mode = WaitListMode::None;
    let app = TestApp::build(
        config,
        helpers::catalog(),
        vec![with_request(student(1), wait_listed(1, 0, &[CHEM], 30))],
        None,
    );

    let report = app
        .engine
        .recheck_report(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    assert_eq!(report.processed, offerings(&[CHEM]));
    assert!(report.outcomes.is_empty());
    assert_eq!(app.sections_of(1, 1).await, None);
    assert_eq!(app.enrollment_count(2).await, 0);
}

#[tokio::test]
async fn test_capacity_override_seats_student_in_full_offering() {
    let mut overridden = wait_listed(1, 0, &[CHEM], 30);
    overridden.overrides.capacity = true;
    let app = TestApp::new(vec![
        chem_filler(101, 20),
        chem_filler(102, 20),
        chem_filler(103, 21),
        chem_filler(104, 21),
        with_request(student(1), overridden),
        with_request(student(2), wait_listed(1, 1, &[CHEM], 60)),
    ]);

    app.engine
        .recheck_offerings(&offerings(&[CHEM]), None, None)
        .await
        .unwrap();

    assert!(app.sections_of(1, 1).await.is_some());
    assert_eq!(app.sections_of(2, 1).await, None);
    assert_eq!(app.enrollment_count(2).await, 5);
}
