use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), labels)
        .unwrap_or_else(|e| panic!("failed to create {}: {}", name, e));
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .unwrap_or_else(|e| panic!("failed to register {}: {}", name, e));
    counter
}

static RECORDS_HANDLED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "library_events_records_handled_total",
        "Records handled by the consumer, by outcome",
        &["outcome"],
    )
});

static PROCESSING_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "library_events_processing_failures_total",
        "Failed processing attempts by error kind",
        &["kind"],
    )
});

static RECORDS_RECOVERED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "library_events_records_recovered_total",
        "Records re-published to a side topic",
        &["route"],
    )
});

static RETRY_SCHEDULER_RECORDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "library_events_retry_scheduler_records_total",
        "Failure records replayed by the retry scheduler, by result",
        &["result"],
    )
});

pub fn record_handled(outcome: &str) {
    RECORDS_HANDLED_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_processing_failure(kind: &str) {
    PROCESSING_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_recovered(route: &str) {
    RECORDS_RECOVERED_TOTAL.with_label_values(&[route]).inc();
}

pub fn record_replay(result: &str) {
    RETRY_SCHEDULER_RECORDS_TOTAL
        .with_label_values(&[result])
        .inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
