use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::PublishError;

/// Record to be written to a side topic, bytes exactly as they should appear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub topic: String,
    /// Explicit partition, or `None` to let the partitioner decide
    pub partition: Option<i32>,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl OutboundRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Publishes records to the broker. Returns (partition, offset) on delivery.
#[async_trait::async_trait]
pub trait RecordPublisher: Send + Sync {
    async fn publish(&self, record: OutboundRecord) -> Result<(i32, i64), PublishError>;
}

#[derive(Clone)]
pub struct KafkaRecordPublisher {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaRecordPublisher {
    pub fn new(producer: FutureProducer, timeout: Duration) -> Self {
        Self { producer, timeout }
    }
}

#[async_trait::async_trait]
impl RecordPublisher for KafkaRecordPublisher {
    async fn publish(&self, record: OutboundRecord) -> Result<(i32, i64), PublishError> {
        let mut headers = OwnedHeaders::new_with_capacity(record.headers.len());
        for (key, value) in &record.headers {
            headers = headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_bytes()),
            });
        }

        let mut future_record: FutureRecord<'_, [u8], [u8]> =
            FutureRecord::to(&record.topic)
                .payload(record.payload.as_slice())
                .headers(headers);
        if let Some(key) = record.key.as_deref() {
            future_record = future_record.key(key);
        }
        if let Some(partition) = record.partition {
            future_record = future_record.partition(partition);
        }

        debug!(
            topic = %record.topic,
            partition = ?record.partition,
            "Publishing record"
        );

        match timeout(self.timeout, self.producer.send(future_record, self.timeout)).await {
            Ok(Ok(delivery)) => Ok(delivery),
            Ok(Err((e, _))) => Err(PublishError::Kafka(e.to_string())),
            Err(_) => {
                warn!(topic = %record.topic, "Kafka send timed out after {:?}", self.timeout);
                Err(PublishError::Timeout)
            }
        }
    }
}
