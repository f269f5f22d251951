use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::services::{EventProcessor, FailureService};

/// Result of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub recovered: usize,
    pub failed: usize,
}

/// Periodically replays RETRY failure records through the event processor.
///
/// Rows that fail again stay RETRY and are picked up on the next pass.
pub struct RetryScheduler {
    processor: Arc<dyn EventProcessor>,
    failure_service: FailureService,
    interval: Duration,
}

impl RetryScheduler {
    pub fn new(
        processor: Arc<dyn EventProcessor>,
        failure_service: FailureService,
        interval: Duration,
    ) -> Self {
        Self {
            processor,
            failure_service,
            interval,
        }
    }

    /// Run passes every `interval` until shutdown. The first pass runs immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(interval = ?self.interval, "Retry scheduler started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    let report = self.retry_failed_records().await;
                    if report.scanned > 0 {
                        info!(
                            scanned = report.scanned,
                            recovered = report.recovered,
                            failed = report.failed,
                            "Retry pass complete"
                        );
                    }
                }
            }
        }

        info!("Retry scheduler stopped");
    }

    /// One sequential pass over all RETRY rows
    pub async fn retry_failed_records(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let records = match self.failure_service.find_retryable().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Failed to load failure records");
                return report;
            }
        };

        debug!(count = records.len(), "Retrying failed records");
        report.scanned = records.len();

        for failure in records {
            let record = failure.to_inbound_record();
            match self.processor.process(&record).await {
                Ok(()) => match self.failure_service.mark_recovered(failure.id).await {
                    Ok(true) => {
                        report.recovered += 1;
                        metrics::record_replay("recovered");
                    }
                    Ok(false) => {
                        warn!(
                            failure_record_id = failure.id,
                            "Failure record changed status during replay"
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        metrics::record_replay("failed");
                        error!(
                            failure_record_id = failure.id,
                            error = %e,
                            "Failed to mark failure record as recovered"
                        );
                    }
                },
                Err(e) => {
                    report.failed += 1;
                    metrics::record_replay("failed");
                    error!(
                        failure_record_id = failure.id,
                        kind = e.kind(),
                        "Replay of failure record failed: {}",
                        e
                    );
                }
            }
        }

        report
    }
}
