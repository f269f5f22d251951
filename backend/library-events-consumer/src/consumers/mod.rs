mod library_events;

pub use library_events::{handle_until_recovered, LibraryEventsConsumer};
