use actix_web::{web, HttpResponse};
use library_event_schema::{LibraryEvent, LibraryEventType};
use tracing::info;
use validator::Validate;

use super::AppState;
use crate::error::{AppError, Result};

/// POST /v1/event
pub async fn post_library_event(
    state: web::Data<AppState>,
    payload: web::Json<LibraryEvent>,
) -> Result<HttpResponse> {
    let event = payload.into_inner();
    info!(event_type = %event.library_event_type, "Received library event: {:?}", event);

    if event.library_event_type != LibraryEventType::New {
        return Err(AppError::Validation(
            "Only NEW event type is supported".to_string(),
        ));
    }
    event.validate()?;

    state.publisher.publish(&event).await?;
    Ok(HttpResponse::Created().json(event))
}

/// PUT /v1/event
pub async fn put_library_event(
    state: web::Data<AppState>,
    payload: web::Json<LibraryEvent>,
) -> Result<HttpResponse> {
    let event = payload.into_inner();
    info!(event_type = %event.library_event_type, "Received library event: {:?}", event);

    if event.library_event_id.is_none() {
        return Err(AppError::Validation(
            "Please pass the LibraryEvent Id".to_string(),
        ));
    }
    if event.library_event_type != LibraryEventType::Update {
        return Err(AppError::Validation(
            "Only UPDATE event type is supported".to_string(),
        ));
    }
    event.validate()?;

    state.publisher.publish(&event).await?;
    Ok(HttpResponse::Ok().json(event))
}
