use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::FutureProducer;
use tracing::{error, info};

use crate::config::KafkaConfig;
use crate::error::{AppError, Result};

/// Consumer in the listener group, subscribed to the primary topic.
///
/// Offsets are committed manually once a record is processed or recovered.
pub fn create_consumer(config: &KafkaConfig, worker_id: usize) -> Result<StreamConsumer> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &config.brokers)
        .set("group.id", &config.group_id)
        .set("client.id", format!("{}-{}", config.group_id, worker_id))
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "latest")
        .set("session.timeout.ms", "30000")
        .set("heartbeat.interval.ms", "3000")
        .set("max.poll.interval.ms", "300000")
        .set("enable.partition.eof", "false")
        .create()
        .map_err(|e| {
            error!("Failed to create Kafka consumer: {}", e);
            AppError::Kafka(e)
        })?;

    consumer.subscribe(&[config.topic.as_str()]).map_err(|e| {
        error!("Failed to subscribe to topic {}: {}", config.topic, e);
        AppError::Kafka(e)
    })?;

    info!(
        worker_id,
        topic = %config.topic,
        group_id = %config.group_id,
        "Kafka consumer subscribed"
    );

    Ok(consumer)
}

/// Producer used to re-publish records to the retry and dead-letter topics
pub fn create_producer(config: &KafkaConfig) -> Result<FutureProducer> {
    ClientConfig::new()
        .set("bootstrap.servers", &config.brokers)
        .set(
            "message.timeout.ms",
            config.publish_timeout.as_millis().to_string(),
        )
        .set("acks", "all")
        .set("enable.idempotence", "true")
        .create()
        .map_err(|e| {
            error!("Failed to create Kafka producer: {}", e);
            AppError::Kafka(e)
        })
}
