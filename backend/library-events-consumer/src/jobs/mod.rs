mod retry_scheduler;

pub use retry_scheduler::{ReconcileReport, RetryScheduler};
