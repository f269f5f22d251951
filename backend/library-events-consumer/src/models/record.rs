use library_event_schema::keys::{decode_key, encode_key};
use rdkafka::message::Message;
use std::fmt;

/// Identity of a broker record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}@{}", self.topic, self.partition, self.offset)
    }
}

/// A record as read from the primary topic, or rebuilt from a failure record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<i32>,
    pub payload: String,
}

impl InboundRecord {
    pub fn id(&self) -> RecordId {
        RecordId {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
        }
    }

    pub fn key_bytes(&self) -> Option<Vec<u8>> {
        self.key.map(|k| encode_key(k).to_vec())
    }

    /// Decode a broker message. Keys must be 4-byte big-endian integers and
    /// payloads valid UTF-8; anything else comes back as [`UndecodableRecord`]
    /// with the raw bytes kept for the dead-letter topic.
    pub fn from_message<M: Message>(msg: &M) -> Result<Self, UndecodableRecord> {
        let key = match msg.key() {
            None => None,
            Some(raw) => match decode_key(raw) {
                Some(k) => Some(k),
                None => {
                    return Err(UndecodableRecord::from_message(
                        msg,
                        format!("Record key is not a 4-byte integer ({} bytes)", raw.len()),
                    ))
                }
            },
        };

        let payload = match msg.payload_view::<str>() {
            Some(Ok(p)) => p.to_string(),
            Some(Err(e)) => {
                return Err(UndecodableRecord::from_message(
                    msg,
                    format!("Record payload is not valid UTF-8: {}", e),
                ))
            }
            None => {
                return Err(UndecodableRecord::from_message(
                    msg,
                    "Record has no payload".to_string(),
                ))
            }
        };

        Ok(Self {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key,
            payload,
        })
    }
}

/// Broker record that could not be turned into an [`InboundRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndecodableRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
    pub reason: String,
}

impl UndecodableRecord {
    fn from_message<M: Message>(msg: &M, reason: String) -> Self {
        Self {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key: msg.key().map(<[u8]>::to_vec),
            payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            reason,
        }
    }

    pub fn id(&self) -> RecordId {
        RecordId {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
        }
    }
}
