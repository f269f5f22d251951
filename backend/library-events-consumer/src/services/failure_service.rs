use std::sync::Arc;
use tracing::{error, info};

use crate::models::{FailureRecord, FailureStatus, InboundRecord};
use crate::repository::FailureRecordRepository;

/// Failure store facade used by the error handler and the retry scheduler
#[derive(Clone)]
pub struct FailureService {
    repository: Arc<dyn FailureRecordRepository>,
}

impl FailureService {
    pub fn new(repository: Arc<dyn FailureRecordRepository>) -> Self {
        Self { repository }
    }

    pub async fn save_failed_record(
        &self,
        record: &InboundRecord,
        error: &str,
        status: FailureStatus,
    ) -> Result<FailureRecord, sqlx::Error> {
        match self.repository.save(record, error, status).await {
            Ok(saved) => {
                info!(
                    failure_record_id = saved.id,
                    record = %record.id(),
                    status = %status,
                    "Saved failure record"
                );
                Ok(saved)
            }
            Err(e) => {
                error!(
                    record = %record.id(),
                    status = %status,
                    error = %e,
                    "Failed to save failure record"
                );
                Err(e)
            }
        }
    }

    pub async fn find_retryable(&self) -> Result<Vec<FailureRecord>, sqlx::Error> {
        self.repository.find_by_status(FailureStatus::Retry).await
    }

    /// RETRY -> SUCCESS. False if another pass already moved the row.
    pub async fn mark_recovered(&self, id: i32) -> Result<bool, sqlx::Error> {
        self.repository
            .update_status(id, FailureStatus::Retry, FailureStatus::Success)
            .await
    }
}
