use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::warn;

use crate::config::SERVICE_NAME;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME
    }))
}

/// Ready once a pooled connection answers
pub async fn readiness_check(pool: web::Data<PgPool>) -> HttpResponse {
    let ready = match db_pool::acquire_with_metrics(pool.get_ref(), SERVICE_NAME).await {
        Ok(mut conn) => sqlx::query("SELECT 1").execute(&mut *conn).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Readiness check could not acquire a connection");
            false
        }
    };

    if ready {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "ready",
            "service": SERVICE_NAME
        }))
    } else {
        HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "not_ready",
            "service": SERVICE_NAME
        }))
    }
}
