use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{DeadLetterPublishingRecoverer, EventProcessor, FailureService, RouteDecision};
use crate::config::RetryConfig;
use crate::error::{ProcessingError, PublishError};
use crate::metrics;
use crate::models::{FailureStatus, InboundRecord, UndecodableRecord};

/// Fixed-delay retry budget for a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoff: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(1),
            max_retries: 2,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            backoff: config.backoff,
            max_retries: config.max_retries,
        }
    }
}

impl RetryPolicy {
    /// `attempts` is the number of attempts made so far, including the failed one
    pub fn should_retry(&self, error: &ProcessingError, attempts: u32) -> bool {
        error.is_retryable() && attempts <= self.max_retries
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// How a record left the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    Processed {
        attempts: u32,
    },
    /// Re-published to a side topic. `exhausted` is false when the error was
    /// not retryable and the backoff loop was skipped.
    Recovered {
        route: RouteDecision,
        attempts: u32,
        exhausted: bool,
    },
}

/// Drives one record through processing, retries and recovery
pub struct ErrorHandler {
    processor: Arc<dyn EventProcessor>,
    recoverer: DeadLetterPublishingRecoverer,
    failure_service: FailureService,
    policy: RetryPolicy,
}

impl ErrorHandler {
    pub fn new(
        processor: Arc<dyn EventProcessor>,
        recoverer: DeadLetterPublishingRecoverer,
        failure_service: FailureService,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            processor,
            recoverer,
            failure_service,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Process `record`, retrying transient failures with a fixed delay.
    ///
    /// Once the budget is spent (or the error is not retryable) the record is
    /// re-published to the retry or dead-letter topic. Only an exhausted
    /// budget leaves a failure record behind. The error is returned only when
    /// that re-publish fails; the record must then be handled again.
    pub async fn handle(&self, record: &InboundRecord) -> Result<HandleOutcome, PublishError> {
        let record_id = record.id();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let error = match self.processor.process(record).await {
                Ok(()) => {
                    metrics::record_handled("processed");
                    return Ok(HandleOutcome::Processed { attempts });
                }
                Err(e) => e,
            };

            metrics::record_processing_failure(error.kind());
            warn!(
                record = %record_id,
                attempt = attempts,
                max_attempts = self.policy.max_attempts(),
                kind = error.kind(),
                "Failed to process record: {}",
                error
            );

            if self.policy.should_retry(&error, attempts) {
                tokio::time::sleep(self.policy.backoff).await;
                continue;
            }

            return self.escalate(record, &error, attempts).await;
        }
    }

    /// Dead-letter a record that could not be decoded at all
    pub async fn handle_undecodable(
        &self,
        record: &UndecodableRecord,
    ) -> Result<HandleOutcome, PublishError> {
        metrics::record_processing_failure("FormatError");
        warn!(
            record = %record.id(),
            "Undecodable record: {}",
            record.reason
        );

        self.recoverer.recover_undecodable(record).await?;

        let route = RouteDecision::DeadLetterTopic;
        metrics::record_recovered(route.as_str());
        metrics::record_handled("recovered");
        Ok(HandleOutcome::Recovered {
            route,
            attempts: 1,
            exhausted: false,
        })
    }

    async fn escalate(
        &self,
        record: &InboundRecord,
        error: &ProcessingError,
        attempts: u32,
    ) -> Result<HandleOutcome, PublishError> {
        let exhausted = error.is_retryable();
        let route = self.recoverer.recover(record, error, attempts).await?;
        metrics::record_recovered(route.as_str());
        metrics::record_handled("recovered");

        info!(
            record = %record.id(),
            route = route.as_str(),
            attempts,
            exhausted,
            "Record recovered"
        );

        if exhausted {
            let status = match route {
                RouteDecision::RetryTopic => FailureStatus::Retry,
                RouteDecision::DeadLetterTopic => FailureStatus::Dead,
            };
            if let Err(e) = self
                .failure_service
                .save_failed_record(record, &error.to_string(), status)
                .await
            {
                error!(
                    record = %record.id(),
                    error = %e,
                    "Failure record not stored"
                );
            }
        }

        Ok(HandleOutcome::Recovered {
            route,
            attempts,
            exhausted,
        })
    }
}
