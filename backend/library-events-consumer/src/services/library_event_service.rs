use library_event_schema::{LibraryEvent, LibraryEventType};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::error::ProcessingError;
use crate::models::InboundRecord;
use crate::repository::LibraryEventRepository;

/// Processes one inbound record. Shared by the live consumer and the retry scheduler.
#[async_trait::async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process(&self, record: &InboundRecord) -> Result<(), ProcessingError>;
}

/// Deserializes, validates and persists library events
pub struct LibraryEventService {
    repository: Arc<dyn LibraryEventRepository>,
    fault_injection_event_id: Option<i32>,
}

impl LibraryEventService {
    pub fn new(
        repository: Arc<dyn LibraryEventRepository>,
        fault_injection_event_id: Option<i32>,
    ) -> Self {
        Self {
            repository,
            fault_injection_event_id,
        }
    }

    async fn validate_update(&self, event: &LibraryEvent) -> Result<(), ProcessingError> {
        let id = event.library_event_id.ok_or_else(|| {
            ProcessingError::Validation("Library Event Id is missing for an UPDATE event".into())
        })?;

        if self.repository.find_by_id(id).await?.is_none() {
            return Err(ProcessingError::Validation(
                "Not a valid library Event: ID does not exist".into(),
            ));
        }

        info!(library_event_id = id, "Validation is successful for the library event");
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventProcessor for LibraryEventService {
    async fn process(&self, record: &InboundRecord) -> Result<(), ProcessingError> {
        let event = LibraryEvent::from_json(&record.payload)?;
        info!(
            event_id = ?event.library_event_id,
            event_type = %event.library_event_type,
            "Processing library event"
        );

        if let (Some(id), Some(fault_id)) = (event.library_event_id, self.fault_injection_event_id)
        {
            if id == fault_id {
                warn!(library_event_id = id, "Simulating transient failure");
                return Err(ProcessingError::Recoverable(
                    "Temporary Network Issue".to_string(),
                ));
            }
        }

        if let Err(e) = event.validate() {
            return Err(ProcessingError::Validation(format!(
                "Invalid library event: {}",
                e
            )));
        }

        match event.library_event_type {
            // Ids for NEW events are assigned by the database
            LibraryEventType::New if event.library_event_id.is_some() => {
                return Err(ProcessingError::Validation(
                    "Library Event Id must be absent for a NEW event".into(),
                ));
            }
            LibraryEventType::New => {}
            LibraryEventType::Update => self.validate_update(&event).await?,
        }

        let saved = self.repository.save(&event).await?;
        info!(
            library_event_id = saved.library_event_id,
            event_type = %saved.library_event_type,
            "Successfully persisted the library event"
        );

        Ok(())
    }
}
