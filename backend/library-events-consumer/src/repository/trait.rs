use library_event_schema::LibraryEvent;

use crate::models::{FailureRecord, FailureStatus, InboundRecord, LibraryEventEntity};

/// Storage for library events and their books.
#[async_trait::async_trait]
pub trait LibraryEventRepository: Send + Sync {
    /// Load an event together with its book
    async fn find_by_id(&self, id: i32) -> Result<Option<LibraryEventEntity>, sqlx::Error>;

    /// Persist an event and its book as one unit.
    ///
    /// Events without an id get one assigned; events with an id are upserted.
    /// The stored book always references the stored event id.
    async fn save(&self, event: &LibraryEvent) -> Result<LibraryEventEntity, sqlx::Error>;
}

/// Storage for records that exhausted their in-pipeline retries.
#[async_trait::async_trait]
pub trait FailureRecordRepository: Send + Sync {
    async fn save(
        &self,
        record: &InboundRecord,
        error: &str,
        status: FailureStatus,
    ) -> Result<FailureRecord, sqlx::Error>;

    async fn find_by_status(&self, status: FailureStatus)
        -> Result<Vec<FailureRecord>, sqlx::Error>;

    /// Move a row from `from` to `to`.
    /// Returns false when the row is no longer in `from`.
    async fn update_status(
        &self,
        id: i32,
        from: FailureStatus,
        to: FailureStatus,
    ) -> Result<bool, sqlx::Error>;
}
