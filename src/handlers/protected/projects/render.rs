// handlers/protected/projects/render.rs - POST /api/projects/:id/generate-render
//
// prompt -> LLM -> renderer. The renderer answers 202 and reports the result
// later through the render callback, so this handler never waits for a video.

use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::load_owned_project;
use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::StatusWrite;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::{RenderRequest, RendererError};
use crate::types::RenderStatus;

pub const CALLBACK_PATH: &str = "/api/projects/render-callback";

#[derive(Debug, Serialize)]
pub struct RenderInitiated {
    pub project_id: Uuid,
    pub status: &'static str,
    pub message: &'static str,
}

#[instrument(skip_all, fields(user_id = %user.user_id, project_id = %id))]
pub async fn generate_render(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<RenderInitiated> {
    let project =
        load_owned_project(&state, &id, user.user_id, "trigger rendering for").await?;

    if project.prompt.trim().is_empty() {
        warn!("Project has an empty prompt");
        return Err(ApiError::bad_request(
            "Project prompt is empty. Please update the project with a valid prompt.",
        ));
    }

    let render_version = log_best_effort(
        "mark project as generating",
        state.repo.begin_render(project.id).await,
    );

    let script = match state.llm.generate_scene(&project.prompt).await {
        Ok(script) => script,
        Err(e) => {
            error!("Code generation failed: {}", e);
            record_failure(&state, project.id, "code_gen_error", render_version).await;
            return Err(ApiError::internal_server_error(
                "Failed to generate Manim code from prompt",
            ));
        }
    };

    let request = RenderRequest {
        project_id: project.id.to_string(),
        script_content: script,
        callback_url: callback_url(&state.config.server.callback_base_url(), render_version),
    };

    if let Err(e) = state.renderer.start_render(&request).await {
        error!("Renderer did not accept job: {}", e);
        record_failure(&state, project.id, &e.failure_stage(), render_version).await;
        return Err(render_error(e));
    }

    info!(?render_version, "Manim rendering process initiated");
    Ok(ApiResponse::accepted(
        "Manim rendering process initiated",
        RenderInitiated {
            project_id: project.id,
            status: "rendering_initiated",
            message: "Manim rendering is in progress. The video URL will be updated via callback.",
        },
    ))
}

/// Callback target for one render attempt. Without a version the callback is
/// accepted unconditionally.
pub fn callback_url(base: &str, render_version: Option<i64>) -> String {
    let base = base.trim_end_matches('/');
    match render_version {
        Some(version) => format!("{}{}?render_version={}", base, CALLBACK_PATH, version),
        None => format!("{}{}", base, CALLBACK_PATH),
    }
}

/// Status writes on the trigger path never change the response: a failed write
/// is logged and dropped.
fn log_best_effort<T>(what: &str, result: Result<T, DatabaseError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Best-effort write failed ({}): {}", what, e);
            None
        }
    }
}

async fn record_failure(state: &AppState, project_id: Uuid, stage: &str, version: Option<i64>) {
    let status = RenderStatus::failed_at(stage);
    let result = state
        .repo
        .set_render_status(project_id, &status, version)
        .await;

    match log_best_effort("record render failure", result) {
        Some(StatusWrite::Stale { current_version }) => {
            info!(current_version, "Newer render in flight; failure not recorded");
        }
        Some(StatusWrite::Missing) => warn!("Project vanished before failure was recorded"),
        _ => {}
    }
}

fn render_error(err: RendererError) -> ApiError {
    match err {
        RendererError::Request(_) => {
            ApiError::internal_server_error("Failed to prepare render request")
        }
        RendererError::Transport(_) | RendererError::InvalidResponse(_) => {
            ApiError::internal_server_error("Failed to connect to Manim renderer")
        }
        RendererError::Rejected { error, .. } => ApiError::upstream(
            500,
            "Failed to start Manim rendering process",
            Some(json!(error.unwrap_or_else(|| "Unknown error from renderer.".to_string()))),
        ),
    }
}
