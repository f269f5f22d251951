//! Kafka header names attached to library event records

/// Set by the ingress service on every published event
pub const EVENT_SOURCE: &str = "event-source";
pub const EVENT_SOURCE_SCANNER: &str = "scanner";

// Diagnostic headers attached when a record is re-published to the retry or
// dead-letter topic.
pub const DLT_EXCEPTION_KIND: &str = "dlt-exception-kind";
pub const DLT_EXCEPTION_MESSAGE: &str = "dlt-exception-message";
pub const DLT_ORIGINAL_TOPIC: &str = "dlt-original-topic";
pub const DLT_ORIGINAL_PARTITION: &str = "dlt-original-partition";
pub const DLT_ORIGINAL_OFFSET: &str = "dlt-original-offset";
pub const DLT_DELIVERY_ATTEMPTS: &str = "dlt-delivery-attempts";
