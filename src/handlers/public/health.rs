use axum::{http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::config;
use crate::database::DatabaseManager;

/// GET / - service information
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "environment": config::config().environment,
            "health": "/api/health"
        }
    }))
}

/// GET /api/health - liveness plus database status.
/// Answers 503 while the database is unreachable.
pub async fn health() -> (StatusCode, Json<Value>) {
    let environment = config::config().environment;
    let timestamp = Utc::now();

    match DatabaseManager::health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "database": "connected",
                    "environment": environment,
                    "timestamp": timestamp
                }
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "SERVICE_UNAVAILABLE",
                    "message": "Database unavailable",
                    "data": {
                        "status": "degraded",
                        "database": "disconnected",
                        "environment": environment,
                        "timestamp": timestamp
                    }
                })),
            )
        }
    }
}
