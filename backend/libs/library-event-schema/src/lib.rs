//! Wire schema for library events exchanged over Kafka
//!
//! Shared by the ingress service and the consumer pipeline so both ends agree
//! on field names, topic names and record key encoding.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

pub mod headers;
pub mod keys;
pub mod topics;

/// Kind of change carried by a [`LibraryEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LibraryEventType {
    New,
    Update,
}

impl LibraryEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryEventType::New => "NEW",
            LibraryEventType::Update => "UPDATE",
        }
    }
}

impl fmt::Display for LibraryEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibraryEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(LibraryEventType::New),
            "UPDATE" => Ok(LibraryEventType::Update),
            other => Err(format!("Unknown library event type: {}", other)),
        }
    }
}

/// Book carried inside a library event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book_id: i32,
    #[validate(length(min = 1, message = "bookName must not be blank"))]
    pub book_name: String,
    #[validate(length(min = 1, message = "bookAuthor must not be blank"))]
    pub book_author: String,
}

/// Library event as published on the primary topic
///
/// `eventId` is absent (or null) for NEW events and carries the persisted id
/// for UPDATE events. The legacy `libraryEventId` / `libraryEventType` field
/// names are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LibraryEvent {
    #[serde(rename = "eventId", alias = "libraryEventId", default)]
    pub library_event_id: Option<i32>,
    #[serde(rename = "eventType", alias = "libraryEventType")]
    pub library_event_type: LibraryEventType,
    #[validate(nested)]
    pub book: Book,
}

impl LibraryEvent {
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
