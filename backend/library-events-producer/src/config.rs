use library_event_schema::topics;
use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub kafka: KafkaConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
    /// Upper bound for the synchronous send
    pub send_timeout: Duration,
    /// librdkafka delivery timeout for queued messages
    pub message_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                host: env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("APP_PORT", 8080)?,
            },
            kafka: KafkaConfig {
                brokers: env::var("KAFKA_BROKERS")
                    .unwrap_or_else(|_| "localhost:9092".to_string()),
                topic: env::var("LIBRARY_EVENTS_TOPIC")
                    .unwrap_or_else(|_| topics::LIBRARY_EVENTS.to_string()),
                send_timeout: Duration::from_millis(parse_var("KAFKA_SEND_TIMEOUT_MS", 1000)?),
                message_timeout: Duration::from_millis(parse_var(
                    "KAFKA_MESSAGE_TIMEOUT_MS",
                    30000,
                )?),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
