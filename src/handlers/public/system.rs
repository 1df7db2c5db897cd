// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Manim orchestrator API",
        "data": {
            "name": "manim-orchestrator",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Turns prompts into Manim videos via an LLM and an external renderer",
            "endpoints": {
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login (public)",
                "account": "/api/profile, /api/delete (protected)",
                "projects": "/api/projects[/:id[/children|/generate-render]] (protected)",
                "renderer": "/api/projects/render-callback, /api/merge_videos (public)",
            }
        }
    }))
}

/// GET /health - liveness plus storage reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.repo.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "API is healthy",
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Database unavailable",
                    "error": { "code": "SERVICE_UNAVAILABLE" },
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unreachable"
                    }
                })),
            )
        }
    }
}
