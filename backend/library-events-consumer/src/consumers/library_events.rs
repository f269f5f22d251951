use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::topic_partition_list::TopicPartitionList;
use rdkafka::Offset;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::KafkaConfig;
use crate::error::Result;
use crate::kafka::create_consumer;
use crate::models::{InboundRecord, UndecodableRecord};
use crate::services::{ErrorHandler, HandleOutcome};

/// Pool of consumer workers sharing the listener group.
///
/// The broker spreads the primary topic's partitions across the workers; each
/// worker handles its records one at a time, in offset order.
pub struct LibraryEventsConsumer {
    config: KafkaConfig,
    handler: Arc<ErrorHandler>,
}

impl LibraryEventsConsumer {
    pub fn new(config: KafkaConfig, handler: Arc<ErrorHandler>) -> Self {
        Self { config, handler }
    }

    /// Create and subscribe every worker, then spawn them.
    ///
    /// Workers stop once `shutdown` fires, after finishing their in-flight record.
    pub fn spawn(self, shutdown: &broadcast::Sender<()>) -> Result<Vec<JoinHandle<()>>> {
        let mut workers = Vec::with_capacity(self.config.concurrency);
        for worker_id in 0..self.config.concurrency {
            workers.push(Worker {
                id: worker_id,
                consumer: create_consumer(&self.config, worker_id)?,
                handler: self.handler.clone(),
            });
        }

        info!(
            concurrency = workers.len(),
            topic = %self.config.topic,
            "Starting library events consumer"
        );

        Ok(workers
            .into_iter()
            .map(|worker| {
                let shutdown_rx = shutdown.subscribe();
                tokio::spawn(worker.run(shutdown_rx))
            })
            .collect())
    }
}

struct Worker {
    id: usize,
    consumer: StreamConsumer,
    handler: Arc<ErrorHandler>,
}

impl Worker {
    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(worker_id = self.id, "Consumer worker started");

        loop {
            let message = tokio::select! {
                _ = shutdown.recv() => break,
                message = self.consumer.recv() => message,
            };

            let (decoded, topic, partition, offset) = match message {
                Ok(msg) => {
                    info!(
                        worker_id = self.id,
                        topic = msg.topic(),
                        partition = msg.partition(),
                        offset = msg.offset(),
                        key = ?msg.key(),
                        "Received library event record"
                    );
                    (
                        InboundRecord::from_message(&msg),
                        msg.topic().to_string(),
                        msg.partition(),
                        msg.offset(),
                    )
                }
                Err(e) => {
                    error!(worker_id = self.id, "Kafka consumer error: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            match handle_until_recovered(&self.handler, &decoded, &mut shutdown).await {
                Some(outcome) => {
                    debug!(worker_id = self.id, ?outcome, "Record handled");
                    self.commit(&topic, partition, offset + 1);
                }
                None => break,
            }
        }

        info!(worker_id = self.id, "Consumer worker stopped");
    }

    fn commit(&self, topic: &str, partition: i32, next_offset: i64) {
        let mut tpl = TopicPartitionList::new();
        if let Err(e) = tpl.add_partition_offset(topic, partition, Offset::Offset(next_offset)) {
            error!(topic, partition, next_offset, "Failed to build commit: {}", e);
            return;
        }
        if let Err(e) = self.consumer.commit(&tpl, CommitMode::Async) {
            error!(topic, partition, next_offset, "Failed to commit offset: {}", e);
        }
    }
}

/// Handle one record until it is either processed or re-published.
///
/// A failed re-publish is retried after one backoff interval, starting a fresh
/// attempt count. Returns `None` if shutdown fires while waiting; the offset
/// must then stay uncommitted.
pub async fn handle_until_recovered(
    handler: &ErrorHandler,
    record: &std::result::Result<InboundRecord, UndecodableRecord>,
    shutdown: &mut broadcast::Receiver<()>,
) -> Option<HandleOutcome> {
    loop {
        let result = match record {
            Ok(inbound) => handler.handle(inbound).await,
            Err(undecodable) => handler.handle_undecodable(undecodable).await,
        };

        match result {
            Ok(outcome) => return Some(outcome),
            Err(e) => {
                warn!(
                    "Recovery publish failed, handling record again in {:?}: {}",
                    handler.policy().backoff,
                    e
                );
                tokio::select! {
                    _ = shutdown.recv() => return None,
                    _ = tokio::time::sleep(handler.policy().backoff) => {}
                }
            }
        }
    }
}
