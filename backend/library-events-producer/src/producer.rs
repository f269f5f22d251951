use library_event_schema::headers::{EVENT_SOURCE, EVENT_SOURCE_SCANNER};
use library_event_schema::keys::encode_key;
use library_event_schema::LibraryEvent;
use rdkafka::error::KafkaError;
use rdkafka::message::{Header, OwnedHeaders, OwnedMessage};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::KafkaConfig;
use crate::error::{AppError, Result};

/// Hands library events to the broker. Lets handlers run without Kafka.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish without waiting for the broker acknowledgement
    async fn publish(&self, event: &LibraryEvent) -> Result<()>;
}

/// Key and JSON value of the record for `event`
pub fn record_parts(event: &LibraryEvent) -> Result<(Option<[u8; 4]>, String)> {
    let key = event.library_event_id.map(encode_key);
    let value = event.to_json()?;
    Ok((key, value))
}

fn event_headers() -> OwnedHeaders {
    OwnedHeaders::new().insert(Header {
        key: EVENT_SOURCE,
        value: Some(EVENT_SOURCE_SCANNER),
    })
}

fn build_record<'a>(
    topic: &'a str,
    key: Option<&'a [u8]>,
    value: &'a str,
) -> FutureRecord<'a, [u8], str> {
    let record = FutureRecord::to(topic).payload(value).headers(event_headers());
    match key {
        Some(key) => record.key(key),
        None => record,
    }
}

/// Waits at most `limit` for a delivery report
async fn await_delivery<F>(delivery: F, limit: Duration) -> Result<(i32, i64)>
where
    F: Future<Output = std::result::Result<(i32, i64), (KafkaError, OwnedMessage)>>,
{
    match timeout(limit, delivery).await {
        Ok(Ok((partition, offset))) => {
            info!(partition, offset, "Library event sent synchronously");
            Ok((partition, offset))
        }
        Ok(Err((e, _))) => {
            error!(error = %e, "Error sending library event");
            Err(AppError::from(e))
        }
        Err(_) => {
            warn!("Kafka send timed out after {:?}", limit);
            Err(AppError::Timeout)
        }
    }
}

/// Kafka producer for the primary library events topic
#[derive(Clone)]
pub struct LibraryEventProducer {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl LibraryEventProducer {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set(
                "message.timeout.ms",
                config.message_timeout.as_millis().to_string(),
            )
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .create()
            .map_err(AppError::from)?;

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            send_timeout: config.send_timeout,
        })
    }

    /// Fire-and-forget send. The returned task logs the delivery result.
    pub fn send_library_event(
        &self,
        event: &LibraryEvent,
    ) -> Result<JoinHandle<Result<(i32, i64)>>> {
        let (key, value) = record_parts(event)?;
        let producer = self.producer.clone();
        let topic = self.topic.clone();
        let queue_timeout = self.send_timeout;

        Ok(tokio::spawn(async move {
            let record = build_record(&topic, key.as_ref().map(|k| &k[..]), &value);

            match producer.send(record, queue_timeout).await {
                Ok((partition, offset)) => {
                    info!(
                        key = ?key.map(i32::from_be_bytes),
                        partition,
                        offset,
                        "Library event sent"
                    );
                    Ok((partition, offset))
                }
                Err((e, _)) => {
                    error!(
                        key = ?key.map(i32::from_be_bytes),
                        error = %e,
                        "Error sending library event"
                    );
                    Err(AppError::from(e))
                }
            }
        }))
    }

    /// Send and wait for the broker acknowledgement, bounded by the send timeout
    pub async fn send_library_event_sync(&self, event: &LibraryEvent) -> Result<(i32, i64)> {
        let (key, value) = record_parts(event)?;
        let record = build_record(&self.topic, key.as_ref().map(|k| &k[..]), &value);

        await_delivery(
            self.producer.send(record, self.send_timeout),
            self.send_timeout,
        )
        .await
    }
}

#[async_trait::async_trait]
impl EventPublisher for LibraryEventProducer {
    async fn publish(&self, event: &LibraryEvent) -> Result<()> {
        self.send_library_event(event).map(|_| ())
    }
}
