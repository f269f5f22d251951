mod common;

use common::*;
use library_event_schema::LibraryEvent;
use library_events_consumer::jobs::{ReconcileReport, RetryScheduler};
use library_events_consumer::models::FailureStatus;
use library_events_consumer::repository::LibraryEventRepository;
use library_events_consumer::services::{FailureService, LibraryEventService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn scheduler_with_fault(
    events: Arc<InMemoryLibraryEventRepository>,
    failures: Arc<InMemoryFailureRecordRepository>,
    fault_injection_event_id: Option<i32>,
) -> RetryScheduler {
    let processor = Arc::new(LibraryEventService::new(events, fault_injection_event_id));
    RetryScheduler::new(
        processor,
        FailureService::new(failures),
        Duration::from_millis(20),
    )
}

#[tokio::test]
async fn test_successful_replay_marks_row_success_without_new_rows() {
    let events = Arc::new(InMemoryLibraryEventRepository::default());
    let failures = Arc::new(InMemoryFailureRecordRepository::default());
    let id = failures.seed(&record(&new_event_json(456), None, 0), FailureStatus::Retry);

    let scheduler = scheduler_with_fault(events.clone(), failures.clone(), Some(999));
    let report = scheduler.retry_failed_records().await;

    assert_eq!(
        report,
        ReconcileReport {
            scanned: 1,
            recovered: 1,
            failed: 0
        }
    );
    let rows = failures.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].status, FailureStatus::Success);
    assert_eq!(events.len(), 1);

    // Second pass finds nothing left to do
    let report = scheduler.retry_failed_records().await;
    assert_eq!(report.scanned, 0);
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_failing_replay_leaves_row_in_retry() {
    let events = Arc::new(InMemoryLibraryEventRepository::default());
    let failures = Arc::new(InMemoryFailureRecordRepository::default());
    let payload = update_event_json(Some(999), 1, "n");
    failures.seed(&record(&payload, Some(999), 0), FailureStatus::Retry);

    let scheduler = scheduler_with_fault(events.clone(), failures.clone(), Some(999));
    let report = scheduler.retry_failed_records().await;

    assert_eq!(report.scanned, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.recovered, 0);
    assert_eq!(failures.rows()[0].status, FailureStatus::Retry);
    assert_eq!(failures.rows().len(), 1);
}

#[tokio::test]
async fn test_dead_and_success_rows_are_not_replayed() {
    let events = Arc::new(InMemoryLibraryEventRepository::default());
    let failures = Arc::new(InMemoryFailureRecordRepository::default());
    failures.seed(&record(&new_event_json(1), None, 0), FailureStatus::Dead);
    failures.seed(&record(&new_event_json(2), None, 1), FailureStatus::Success);

    let scheduler = scheduler_with_fault(events.clone(), failures.clone(), None);
    let report = scheduler.retry_failed_records().await;

    assert_eq!(report, ReconcileReport::default());
    assert_eq!(events.len(), 0);
    let statuses: Vec<_> = failures.rows().iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![FailureStatus::Dead, FailureStatus::Success]);
}

#[tokio::test]
async fn test_rows_recover_once_the_fault_clears() {
    let events = Arc::new(InMemoryLibraryEventRepository::default());
    let failures = Arc::new(InMemoryFailureRecordRepository::default());
    let existing = LibraryEvent::from_json(&update_event_json(Some(999), 7, "original")).unwrap();
    events.save(&existing).await.unwrap();
    let payload = update_event_json(Some(999), 7, "recovered");
    failures.seed(&record(&payload, Some(999), 0), FailureStatus::Retry);

    let failing = scheduler_with_fault(events.clone(), failures.clone(), Some(999));
    assert_eq!(failing.retry_failed_records().await.failed, 1);

    let healthy = scheduler_with_fault(events.clone(), failures.clone(), None);
    assert_eq!(healthy.retry_failed_records().await.recovered, 1);
    assert_eq!(failures.rows()[0].status, FailureStatus::Success);
    assert_eq!(
        events.events()[0].book.as_ref().unwrap().book_name,
        "recovered"
    );
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let events = Arc::new(InMemoryLibraryEventRepository::default());
    let failures = Arc::new(InMemoryFailureRecordRepository::default());
    failures.seed(&record(&new_event_json(456), None, 0), FailureStatus::Retry);

    let scheduler = scheduler_with_fault(events.clone(), failures.clone(), Some(999));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    // First tick fires immediately
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
    assert_eq!(failures.rows()[0].status, FailureStatus::Success);
}
