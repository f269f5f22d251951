mod library_events;

use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::error::AppError;
use crate::producer::EventPublisher;

pub use library_events::{post_library_event, put_library_event};

pub struct AppState {
    pub publisher: Arc<dyn EventPublisher>,
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "library-events-producer"
    }))
}

/// Undecodable bodies are reported as 400s in the same JSON shape as handler errors
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid request body: {}", err)).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/health", web::get().to(health_check))
        .service(
            web::resource("/v1/event")
                .route(web::post().to(post_library_event))
                .route(web::put().to(put_library_event)),
        );
}
