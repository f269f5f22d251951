use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_events_consumer::config::Config;
use library_events_consumer::consumers::LibraryEventsConsumer;
use library_events_consumer::db::init_pool;
use library_events_consumer::health;
use library_events_consumer::jobs::RetryScheduler;
use library_events_consumer::kafka::{create_producer, KafkaRecordPublisher};
use library_events_consumer::metrics::serve_metrics;
use library_events_consumer::repository::{PgFailureRecordRepository, PgLibraryEventRepository};
use library_events_consumer::services::{
    DeadLetterPublishingRecoverer, ErrorHandler, EventProcessor, FailureService,
    LibraryEventService, RetryPolicy,
};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "library_events_consumer=info,db_pool=info,rdkafka=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting library events consumer");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        topic = %config.kafka.topic,
        concurrency = config.kafka.concurrency,
        fault_injection_event_id = ?config.fault_injection_event_id,
        "Configuration loaded"
    );

    let pool = init_pool(config.database.clone())
        .await
        .context("Failed to initialize database")?;

    let event_repository = Arc::new(PgLibraryEventRepository::new(pool.clone()));
    let failure_service =
        FailureService::new(Arc::new(PgFailureRecordRepository::new(pool.clone())));
    let processor: Arc<dyn EventProcessor> = Arc::new(LibraryEventService::new(
        event_repository,
        config.fault_injection_event_id,
    ));

    let producer = create_producer(&config.kafka).context("Failed to create Kafka producer")?;
    let publisher = Arc::new(KafkaRecordPublisher::new(
        producer,
        config.kafka.publish_timeout,
    ));
    let recoverer = DeadLetterPublishingRecoverer::new(
        publisher,
        config.kafka.retry_topic.clone(),
        config.kafka.dlt_topic.clone(),
    );
    let handler = Arc::new(ErrorHandler::new(
        processor.clone(),
        recoverer,
        failure_service.clone(),
        RetryPolicy::from(&config.retry),
    ));

    let (shutdown_tx, _) = broadcast::channel(1);

    let mut tasks = LibraryEventsConsumer::new(config.kafka.clone(), handler)
        .spawn(&shutdown_tx)
        .context("Failed to start Kafka consumers")?;

    if config.scheduler.enabled {
        let scheduler = RetryScheduler::new(processor, failure_service, config.scheduler.interval);
        tasks.push(tokio::spawn(scheduler.run(shutdown_tx.subscribe())));
    } else {
        info!("Retry scheduler disabled by configuration");
    }

    let pool_data = web::Data::new(pool.clone());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/ready", web::get().to(health::readiness_check))
            .route("/metrics", web::get().to(serve_metrics))
    })
    .bind(("0.0.0.0", config.app.http_port))
    .context("Failed to bind HTTP server")?
    .disable_signals()
    .run();
    let server_handle = server.handle();

    info!(port = config.app.http_port, "HTTP server is running");
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    info!("Shutdown signal received, stopping consumers");

    let _ = shutdown_tx.send(());
    server_handle.stop(true).await;

    for task in tasks {
        if let Err(e) = task.await {
            error!("Background task join error: {}", e);
        }
    }
    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("HTTP server error: {}", e),
        Err(e) => error!("HTTP server join error: {}", e),
    }

    pool.close().await;
    info!("Library events consumer stopped");
    Ok(())
}
