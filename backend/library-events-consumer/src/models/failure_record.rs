use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::InboundRecord;

/// Delivery status of a failure record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailureStatus {
    /// Eligible for replay by the retry scheduler
    Retry,
    /// Routed to the dead-letter topic; kept for bookkeeping only
    Dead,
    /// Replayed successfully
    Success,
}

impl FailureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStatus::Retry => "RETRY",
            FailureStatus::Dead => "DEAD",
            FailureStatus::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for FailureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RETRY" => Ok(FailureStatus::Retry),
            "DEAD" => Ok(FailureStatus::Dead),
            "SUCCESS" => Ok(FailureStatus::Success),
            other => Err(format!("Unknown failure status: {}", other)),
        }
    }
}

/// Durable copy of a record that exhausted its in-pipeline retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub id: i32,
    pub topic: String,
    pub partition: i32,
    pub offset_value: i64,
    pub key_value: Option<i32>,
    /// Raw payload exactly as received
    pub error_record: String,
    pub exception: String,
    pub status: FailureStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FailureRecord {
    /// Rebuild the inbound record so it can be replayed through the processor
    pub fn to_inbound_record(&self) -> InboundRecord {
        InboundRecord {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset_value,
            key: self.key_value,
            payload: self.error_record.clone(),
        }
    }
}
