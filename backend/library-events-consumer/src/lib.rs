//! Library events consumer
//!
//! Consumes library events from Kafka and persists them to PostgreSQL.
//! Transient failures are retried in place with a fixed backoff, then
//! re-published to the retry topic and recorded in the failure store, where
//! the retry scheduler replays them. Deterministic failures go straight to the
//! dead-letter topic.

pub mod config;
pub mod consumers;
pub mod db;
pub mod error;
pub mod health;
pub mod jobs;
pub mod kafka;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;

pub use error::{AppError, ProcessingError, PublishError, Result};
