//! Default topic and consumer group names
//!
//! Services read the actual names from configuration; these are the defaults.

pub const LIBRARY_EVENTS: &str = "library-events";
pub const LIBRARY_EVENTS_RETRY: &str = "library-events.RETRY";
pub const LIBRARY_EVENTS_DLT: &str = "library-events.DLT";

pub const LIBRARY_EVENTS_LISTENER_GROUP: &str = "library-events-listener-group";
