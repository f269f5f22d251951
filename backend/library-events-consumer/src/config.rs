use db_pool::{parse_env_with_default, DbConfig};
use library_event_schema::topics;
use std::env;
use std::time::Duration;

use crate::error::AppError;

pub const SERVICE_NAME: &str = "library-events-consumer";

const DEFAULT_FAULT_INJECTION_EVENT_ID: i32 = 999;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub kafka: KafkaConfig,
    pub retry: RetryConfig,
    pub scheduler: SchedulerConfig,
    pub database: DbConfig,
    /// Event id that always fails with a recoverable error, used to exercise
    /// the retry path end to end. `None` disables the hook.
    pub fault_injection_event_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    /// Port for `/health` and `/metrics`
    pub http_port: u16,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub group_id: String,
    pub topic: String,
    pub retry_topic: String,
    pub dlt_topic: String,
    /// Number of consumer workers in the group
    pub concurrency: usize,
    pub publish_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub backoff: Duration,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            group_id: topics::LIBRARY_EVENTS_LISTENER_GROUP.to_string(),
            topic: topics::LIBRARY_EVENTS.to_string(),
            retry_topic: topics::LIBRARY_EVENTS_RETRY.to_string(),
            dlt_topic: topics::LIBRARY_EVENTS_DLT.to_string(),
            concurrency: 3,
            publish_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff: Duration::from_millis(1000),
            max_retries: 2,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let database = DbConfig::from_env(SERVICE_NAME).map_err(AppError::Config)?;

        let kafka_defaults = KafkaConfig::default();
        let kafka = KafkaConfig {
            brokers: env::var("KAFKA_BROKERS").unwrap_or(kafka_defaults.brokers),
            group_id: env::var("KAFKA_GROUP_ID").unwrap_or(kafka_defaults.group_id),
            topic: env::var("LIBRARY_EVENTS_TOPIC").unwrap_or(kafka_defaults.topic),
            retry_topic: env::var("LIBRARY_EVENTS_RETRY_TOPIC")
                .unwrap_or(kafka_defaults.retry_topic),
            dlt_topic: env::var("LIBRARY_EVENTS_DLT_TOPIC").unwrap_or(kafka_defaults.dlt_topic),
            concurrency: parse_env_with_default(
                "CONSUMER_CONCURRENCY",
                kafka_defaults.concurrency,
            )
            .max(1),
            publish_timeout: Duration::from_secs(parse_env_with_default(
                "KAFKA_PUBLISH_TIMEOUT_SECS",
                kafka_defaults.publish_timeout.as_secs(),
            )),
        };

        let retry_defaults = RetryConfig::default();
        let retry = RetryConfig {
            backoff: Duration::from_millis(parse_env_with_default(
                "RETRY_BACKOFF_MS",
                retry_defaults.backoff.as_millis() as u64,
            )),
            max_retries: parse_env_with_default("RETRY_MAX_ATTEMPTS", retry_defaults.max_retries),
        };

        let scheduler_defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            enabled: parse_env_with_default("RETRY_SCHEDULER_ENABLED", scheduler_defaults.enabled),
            interval: Duration::from_secs(
                parse_env_with_default(
                    "RETRY_SCHEDULER_INTERVAL_SECS",
                    scheduler_defaults.interval.as_secs(),
                )
                .max(1),
            ),
        };

        Ok(Self {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                http_port: parse_env_with_default("HTTP_PORT", 8081),
            },
            kafka,
            retry,
            scheduler,
            database,
            fault_injection_event_id: parse_fault_injection_id(
                env::var("FAULT_INJECTION_EVENT_ID").ok().as_deref(),
            )?,
        })
    }
}

/// Missing means the default id; `none` or empty disables the hook.
fn parse_fault_injection_id(raw: Option<&str>) -> Result<Option<i32>, AppError> {
    match raw.map(str::trim) {
        None => Ok(Some(DEFAULT_FAULT_INJECTION_EVENT_ID)),
        Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("none") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| {
            AppError::Config(format!("FAULT_INJECTION_EVENT_ID must be an integer, got {}", v))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "KAFKA_BROKERS",
        "KAFKA_GROUP_ID",
        "LIBRARY_EVENTS_TOPIC",
        "LIBRARY_EVENTS_RETRY_TOPIC",
        "LIBRARY_EVENTS_DLT_TOPIC",
        "CONSUMER_CONCURRENCY",
        "RETRY_BACKOFF_MS",
        "RETRY_MAX_ATTEMPTS",
        "RETRY_SCHEDULER_ENABLED",
        "RETRY_SCHEDULER_INTERVAL_SECS",
        "FAULT_INJECTION_EVENT_ID",
        "HTTP_PORT",
    ];

    fn reset_env() {
        for var in VARS {
            env::remove_var(var);
        }
        env::set_var("DATABASE_URL", "postgres://localhost/library");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        reset_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.kafka.topic, "library-events");
        assert_eq!(config.kafka.retry_topic, "library-events.RETRY");
        assert_eq!(config.kafka.dlt_topic, "library-events.DLT");
        assert_eq!(config.kafka.group_id, "library-events-listener-group");
        assert_eq!(config.kafka.concurrency, 3);
        assert_eq!(config.retry.backoff, Duration::from_secs(1));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.scheduler.interval, Duration::from_secs(10));
        assert!(config.scheduler.enabled);
        assert_eq!(config.fault_injection_event_id, Some(999));

        env::remove_var("DATABASE_URL");
    }

    #[test]
    #[serial]
    fn test_overrides() {
        reset_env();
        env::set_var("CONSUMER_CONCURRENCY", "0");
        env::set_var("RETRY_BACKOFF_MS", "250");
        env::set_var("RETRY_SCHEDULER_ENABLED", "false");
        env::set_var("FAULT_INJECTION_EVENT_ID", "none");

        let config = Config::from_env().unwrap();
        assert_eq!(config.kafka.concurrency, 1);
        assert_eq!(config.retry.backoff, Duration::from_millis(250));
        assert!(!config.scheduler.enabled);
        assert_eq!(config.fault_injection_event_id, None);

        reset_env();
        env::remove_var("DATABASE_URL");
    }

    #[test]
    fn test_fault_injection_parsing() {
        assert_eq!(parse_fault_injection_id(None).unwrap(), Some(999));
        assert_eq!(parse_fault_injection_id(Some("")).unwrap(), None);
        assert_eq!(parse_fault_injection_id(Some("NONE")).unwrap(), None);
        assert_eq!(parse_fault_injection_id(Some(" 42 ")).unwrap(), Some(42));
        assert!(parse_fault_injection_id(Some("abc")).is_err());
    }
}
