//! Routing of failed records to the retry and dead-letter topics

use library_event_schema::headers;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{ProcessingError, PublishError};
use crate::kafka::{OutboundRecord, RecordPublisher};
use crate::models::{InboundRecord, RecordId, UndecodableRecord};

/// Where a failed record is re-published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    RetryTopic,
    DeadLetterTopic,
}

impl RouteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::RetryTopic => "retry",
            RouteDecision::DeadLetterTopic => "dead_letter",
        }
    }
}

/// Transient failures go to the retry topic, everything else is dead-lettered.
pub fn classify(error: &ProcessingError) -> RouteDecision {
    if error.is_transient() {
        RouteDecision::RetryTopic
    } else {
        RouteDecision::DeadLetterTopic
    }
}

/// Re-publishes failed records unchanged, on the source partition, with
/// diagnostic headers describing the failure.
pub struct DeadLetterPublishingRecoverer {
    publisher: Arc<dyn RecordPublisher>,
    retry_topic: String,
    dlt_topic: String,
}

impl DeadLetterPublishingRecoverer {
    pub fn new(
        publisher: Arc<dyn RecordPublisher>,
        retry_topic: impl Into<String>,
        dlt_topic: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            retry_topic: retry_topic.into(),
            dlt_topic: dlt_topic.into(),
        }
    }

    pub fn topic_for(&self, route: RouteDecision) -> &str {
        match route {
            RouteDecision::RetryTopic => &self.retry_topic,
            RouteDecision::DeadLetterTopic => &self.dlt_topic,
        }
    }

    pub async fn recover(
        &self,
        record: &InboundRecord,
        error: &ProcessingError,
        attempts: u32,
    ) -> Result<RouteDecision, PublishError> {
        let route = classify(error);
        let outbound = OutboundRecord {
            topic: self.topic_for(route).to_string(),
            partition: Some(record.partition),
            key: record.key_bytes(),
            payload: record.payload.as_bytes().to_vec(),
            headers: diagnostic_headers(&record.id(), error.kind(), &error.to_string(), attempts),
        };

        self.publish(outbound, &record.id(), route).await?;
        Ok(route)
    }

    /// Records that never decoded are always dead-lettered, raw bytes intact
    pub async fn recover_undecodable(&self, record: &UndecodableRecord) -> Result<(), PublishError> {
        let route = RouteDecision::DeadLetterTopic;
        let outbound = OutboundRecord {
            topic: self.topic_for(route).to_string(),
            partition: Some(record.partition),
            key: record.key.clone(),
            payload: record.payload.clone(),
            headers: diagnostic_headers(&record.id(), "FormatError", &record.reason, 1),
        };

        self.publish(outbound, &record.id(), route).await
    }

    async fn publish(
        &self,
        outbound: OutboundRecord,
        source: &RecordId,
        route: RouteDecision,
    ) -> Result<(), PublishError> {
        let topic = outbound.topic.clone();
        match self.publisher.publish(outbound).await {
            Ok((partition, offset)) => {
                info!(
                    record = %source,
                    route = route.as_str(),
                    topic = %topic,
                    partition,
                    offset,
                    "Published failed record"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    record = %source,
                    route = route.as_str(),
                    topic = %topic,
                    error = %e,
                    "Failed to publish failed record"
                );
                Err(e)
            }
        }
    }
}

fn diagnostic_headers(
    source: &RecordId,
    kind: &str,
    message: &str,
    attempts: u32,
) -> Vec<(String, String)> {
    vec![
        (headers::DLT_EXCEPTION_KIND.to_string(), kind.to_string()),
        (headers::DLT_EXCEPTION_MESSAGE.to_string(), message.to_string()),
        (headers::DLT_ORIGINAL_TOPIC.to_string(), source.topic.clone()),
        (
            headers::DLT_ORIGINAL_PARTITION.to_string(),
            source.partition.to_string(),
        ),
        (
            headers::DLT_ORIGINAL_OFFSET.to_string(),
            source.offset.to_string(),
        ),
        (
            headers::DLT_DELIVERY_ATTEMPTS.to_string(),
            attempts.to_string(),
        ),
    ]
}
