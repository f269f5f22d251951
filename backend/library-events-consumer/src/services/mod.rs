mod error_handler;
mod failure_service;
mod library_event_service;
mod recovery;

pub use error_handler::{ErrorHandler, HandleOutcome, RetryPolicy};
pub use failure_service::FailureService;
pub use library_event_service::{EventProcessor, LibraryEventService};
pub use recovery::{classify, DeadLetterPublishingRecoverer, RouteDecision};
