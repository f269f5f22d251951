mod failure_record_repository;
mod library_event_repository;
mod r#trait;

pub use failure_record_repository::PgFailureRecordRepository;
pub use library_event_repository::PgLibraryEventRepository;
pub use r#trait::{FailureRecordRepository, LibraryEventRepository};
