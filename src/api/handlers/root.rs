use axum::{extract::State, http::StatusCode, Json, response::IntoResponse};
use serde_json::json;

use crate::api::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "RailAnnounce",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multilingual railway announcements with speech and live display boards",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "announcements": "/api/announcements",
            "display": "/api/display/current",
            "websocket": "/ws/display-board"
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1")
        .execute(&state.service_context.db_pool)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!("Health check database error: {}", e);
            "unavailable"
        }
    };

    let status = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(json!({
        "status": if database == "ok" { "healthy" } else { "degraded" },
        "database": database,
        "display_boards": state.service_context.channels.channel_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
