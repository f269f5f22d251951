mod failure_record;
mod library_event;
mod record;

pub use failure_record::{FailureRecord, FailureStatus};
pub use library_event::{BookEntity, LibraryEventEntity};
pub use record::{InboundRecord, RecordId, UndecodableRecord};
