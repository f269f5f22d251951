mod client;
mod publisher;

pub use client::{create_consumer, create_producer};
pub use publisher::{KafkaRecordPublisher, OutboundRecord, RecordPublisher};
