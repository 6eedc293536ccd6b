//! Integration tests for the background recheck worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use sectioning_core::config::WorkerConfig;
use sectioning_core::types::id::{OfferingId, SectionId};
use sectioning_entity::student::Student;
use sectioning_worker::{RecheckQueue, RecheckRunner};

use crate::helpers::{
    self, CHEM, TestApp, enrolled, enrollment, request, student, wait_listed, with_request,
};

fn crowded_chemistry() -> Vec<Student> {
    let mut students: Vec<Student> = [(101, 20), (102, 20), (103, 21), (104, 21)]
        .into_iter()
        .map(|(id, section)| {
            with_request(
                student(id),
                enrolled(request(1, 0, &[CHEM]), enrollment(2, CHEM, 2, &[section])),
            )
        })
        .collect();
    students.push(with_request(student(1), wait_listed(1, 0, &[CHEM], 30)));
    students
}

fn worker_config() -> WorkerConfig {
    WorkerConfig {
        enabled: true,
        concurrency: 2,
        poll_interval_seconds: 1,
        sweep_schedule: String::new(),
    }
}

async fn grow_section_21(app: &TestApp) -> Vec<OfferingId> {
    let mut data = helpers::catalog();
    data.sections
        .iter_mut()
        .filter(|s| s.id == SectionId::new(21))
        .for_each(|s| s.limit = 3);
    app.engine.refresh_catalog(data).await.unwrap()
}

#[tokio::test]
async fn test_run_once_processes_queued_offerings() {
    let app = TestApp::new(crowded_chemistry());
    let queue = Arc::new(RecheckQueue::new());
    let runner = RecheckRunner::new(app.engine.clone(), queue.clone(), worker_config());

    queue.enqueue_all(grow_section_21(&app).await).await;
    queue.enqueue(OfferingId::new(CHEM)).await;
    assert_eq!(queue.len().await, 1);

    let results = runner.run_once().await;

    assert_eq!(results.len(), 1);
    let report = results[0].as_ref().unwrap();
    assert_eq!(report.changed(), 1);
    assert!(queue.is_empty().await);
    assert_eq!(app.sections_of(1, 1).await, Some(vec![21]));
}

#[tokio::test]
async fn test_runner_stops_on_cancel() {
    let app = TestApp::new(crowded_chemistry());
    let queue = Arc::new(RecheckQueue::new());
    let runner = RecheckRunner::new(app.engine.clone(), queue.clone(), worker_config());
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { runner.run(cancel_rx).await });

    queue.enqueue_all(grow_section_21(&app).await).await;

    let mut seated = false;
    for _ in 0..50 {
        if app.sections_of(1, 1).await.is_some() {
            seated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(seated);

    cancel_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
