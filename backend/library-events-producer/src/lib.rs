//! Library events ingress
//!
//! HTTP API that accepts library events and publishes them to Kafka.

pub mod config;
pub mod error;
pub mod handlers;
pub mod producer;

pub use error::{AppError, Result};
pub use producer::{EventPublisher, LibraryEventProducer};
