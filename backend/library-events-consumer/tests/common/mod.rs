#![allow(dead_code)]

use chrono::Utc;
use library_event_schema::LibraryEvent;
use library_events_consumer::error::{ProcessingError, PublishError};
use library_events_consumer::kafka::{OutboundRecord, RecordPublisher};
use library_events_consumer::models::{
    BookEntity, FailureRecord, FailureStatus, InboundRecord, LibraryEventEntity,
};
use library_events_consumer::repository::{FailureRecordRepository, LibraryEventRepository};
use library_events_consumer::services::{
    DeadLetterPublishingRecoverer, ErrorHandler, EventProcessor, FailureService,
    LibraryEventService, RetryPolicy,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOPIC: &str = "library-events";
pub const RETRY_TOPIC: &str = "library-events.RETRY";
pub const DLT_TOPIC: &str = "library-events.DLT";

pub fn new_event_json(book_id: i32) -> String {
    format!(
        r#"{{"eventId":null,"eventType":"NEW","book":{{"bookId":{},"bookName":"Kafka Using Spring Boot","bookAuthor":"Dilip"}}}}"#,
        book_id
    )
}

pub fn update_event_json(event_id: Option<i32>, book_id: i32, book_name: &str) -> String {
    let id = event_id.map_or("null".to_string(), |id| id.to_string());
    format!(
        r#"{{"eventId":{},"eventType":"UPDATE","book":{{"bookId":{},"bookName":"{}","bookAuthor":"Dilip"}}}}"#,
        id, book_id, book_name
    )
}

pub fn record(payload: &str, key: Option<i32>, offset: i64) -> InboundRecord {
    InboundRecord {
        topic: TOPIC.to_string(),
        partition: 1,
        offset,
        key,
        payload: payload.to_string(),
    }
}

/// Library event store mirroring the PostgreSQL upsert semantics
#[derive(Default)]
pub struct InMemoryLibraryEventRepository {
    state: Mutex<EventState>,
}

#[derive(Default)]
struct EventState {
    next_id: i32,
    events: BTreeMap<i32, LibraryEventEntity>,
}

impl InMemoryLibraryEventRepository {
    pub fn events(&self) -> Vec<LibraryEventEntity> {
        self.state.lock().unwrap().events.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }
}

#[async_trait::async_trait]
impl LibraryEventRepository for InMemoryLibraryEventRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<LibraryEventEntity>, sqlx::Error> {
        Ok(self.state.lock().unwrap().events.get(&id).cloned())
    }

    async fn save(&self, event: &LibraryEvent) -> Result<LibraryEventEntity, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let id = match event.library_event_id {
            Some(id) => id,
            None => {
                state.next_id += 1;
                state.next_id
            }
        };

        // A book belongs to one event only
        for other in state.events.values_mut() {
            if other.book.as_ref().map(|b| b.book_id) == Some(event.book.book_id) {
                other.book = None;
            }
        }

        let entity = LibraryEventEntity {
            library_event_id: id,
            library_event_type: event.library_event_type,
            book: Some(BookEntity::linked_to(id, &event.book)),
        };
        state.events.insert(id, entity.clone());
        Ok(entity)
    }
}

/// Failure store kept in memory
#[derive(Default)]
pub struct InMemoryFailureRecordRepository {
    rows: Mutex<Vec<FailureRecord>>,
    fail_saves: Mutex<bool>,
}

impl InMemoryFailureRecordRepository {
    pub fn rows(&self) -> Vec<FailureRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }

    /// Seed a row directly, bypassing the error handler
    pub fn seed(&self, record: &InboundRecord, status: FailureStatus) -> i32 {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i32 + 1;
        let now = Utc::now();
        rows.push(FailureRecord {
            id,
            topic: record.topic.clone(),
            partition: record.partition,
            offset_value: record.offset,
            key_value: record.key,
            error_record: record.payload.clone(),
            exception: "seeded".to_string(),
            status,
            created_at: now,
            updated_at: now,
        });
        id
    }
}

#[async_trait::async_trait]
impl FailureRecordRepository for InMemoryFailureRecordRepository {
    async fn save(
        &self,
        record: &InboundRecord,
        error: &str,
        status: FailureStatus,
    ) -> Result<FailureRecord, sqlx::Error> {
        if *self.fail_saves.lock().unwrap() {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let id = self.seed(record, status);
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(sqlx::Error::RowNotFound)?;
        row.exception = error.to_string();
        Ok(row.clone())
    }

    async fn find_by_status(
        &self,
        status: FailureStatus,
    ) -> Result<Vec<FailureRecord>, sqlx::Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: i32,
        from: FailureStatus,
        to: FailureStatus,
    ) -> Result<bool, sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && r.status == from) {
            Some(row) => {
                row.status = to;
                row.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Captures published records; can be told to fail the next N publishes
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<OutboundRecord>>,
    failures_left: AtomicU32,
    attempts: AtomicU32,
}

impl RecordingPublisher {
    pub fn failing(times: u32) -> Self {
        let publisher = Self::default();
        publisher.failures_left.store(times, Ordering::SeqCst);
        publisher
    }

    pub fn published(&self) -> Vec<OutboundRecord> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_to(&self, topic: &str) -> Vec<OutboundRecord> {
        self.published()
            .into_iter()
            .filter(|r| r.topic == topic)
            .collect()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordPublisher for RecordingPublisher {
    async fn publish(&self, record: OutboundRecord) -> Result<(i32, i64), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(PublishError::Kafka("broker unavailable".to_string()));
        }

        let mut published = self.published.lock().unwrap();
        published.push(record.clone());
        Ok((record.partition.unwrap_or(0), published.len() as i64 - 1))
    }
}

/// Counts calls before delegating to the real processor
pub struct CountingProcessor {
    inner: Arc<dyn EventProcessor>,
    calls: AtomicU32,
}

impl CountingProcessor {
    pub fn new(inner: Arc<dyn EventProcessor>) -> Self {
        Self {
            inner,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EventProcessor for CountingProcessor {
    async fn process(&self, record: &InboundRecord) -> Result<(), ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.process(record).await
    }
}

/// Fails with a transient error for the first `failures` calls, then succeeds
pub struct FlakyProcessor {
    failures: u32,
    calls: AtomicU32,
}

impl FlakyProcessor {
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EventProcessor for FlakyProcessor {
    async fn process(&self, _record: &InboundRecord) -> Result<(), ProcessingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(ProcessingError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        backoff: Duration::from_millis(10),
        max_retries: 2,
    }
}

/// The full pipeline wired to in-memory collaborators
pub struct Harness {
    pub events: Arc<InMemoryLibraryEventRepository>,
    pub failures: Arc<InMemoryFailureRecordRepository>,
    pub publisher: Arc<RecordingPublisher>,
    pub processor: Arc<CountingProcessor>,
    pub failure_service: FailureService,
    pub handler: ErrorHandler,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_publisher(RecordingPublisher::default())
    }

    pub fn with_publisher(publisher: RecordingPublisher) -> Self {
        let events = Arc::new(InMemoryLibraryEventRepository::default());
        let failures = Arc::new(InMemoryFailureRecordRepository::default());
        let publisher = Arc::new(publisher);
        let service = Arc::new(LibraryEventService::new(events.clone(), Some(999)));
        let processor = Arc::new(CountingProcessor::new(service));
        let failure_service = FailureService::new(failures.clone());
        let recoverer =
            DeadLetterPublishingRecoverer::new(publisher.clone(), RETRY_TOPIC, DLT_TOPIC);
        let handler = ErrorHandler::new(
            processor.clone(),
            recoverer,
            failure_service.clone(),
            fast_policy(),
        );

        Self {
            events,
            failures,
            publisher,
            processor,
            failure_service,
            handler,
        }
    }
}
