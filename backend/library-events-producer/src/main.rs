use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_events_producer::config::Config;
use library_events_producer::handlers::{self, AppState};
use library_events_producer::LibraryEventProducer;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "library_events_producer=info,actix_web=info,rdkafka=warn".into());
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

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        topic = %config.kafka.topic,
        "Starting library events producer"
    );

    let producer =
        LibraryEventProducer::new(&config.kafka).context("Failed to create Kafka producer")?;
    let state = web::Data::new(AppState {
        publisher: Arc::new(producer),
    });

    info!("Starting HTTP server on {}:{}", config.app.host, config.app.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind((config.app.host.as_str(), config.app.port))
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")
}
