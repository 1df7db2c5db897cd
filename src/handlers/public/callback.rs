// handlers/public/callback.rs - POST /api/projects/render-callback
//
// Called by the renderer once a job finishes. Unauthenticated; the project id
// in the body and the render version in the query identify the job.

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::database::models::StatusWrite;
use crate::error::ApiError;
use crate::middleware::AppJson;
use crate::types::RenderStatus;

#[derive(Debug, Deserialize)]
pub struct RenderCallback {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_details: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub render_version: Option<String>,
}

#[instrument(skip_all, fields(project_id = %callback.project_id, status = %callback.status))]
pub async fn render_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    AppJson(callback): AppJson<RenderCallback>,
) -> ApiResult<()> {
    let project_id = Uuid::parse_str(&callback.project_id)
        .map_err(|_| ApiError::bad_request("Invalid ProjectID in callback"))?;
    if callback.status.trim().is_empty() {
        return Err(ApiError::field_error("status", "is required"));
    }
    let expected_version = match query.render_version.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ApiError::bad_request("Invalid render_version in callback"))?,
        ),
    };
    if expected_version.is_none() {
        warn!("Callback carries no render version; applying unconditionally");
    }

    let status = RenderStatus::from_callback(&callback.status, &callback.video_url);
    match &status {
        RenderStatus::Completed(Some(url)) => info!("Render completed: {}", url),
        RenderStatus::Completed(None) => warn!("Render completed without a usable video URL"),
        other => error!(
            "Render ended with status '{}': {} {}",
            other, callback.message, callback.error_details
        ),
    }

    match state
        .repo
        .set_render_status(project_id, &status, expected_version)
        .await?
    {
        StatusWrite::Applied(_) => Ok(ApiResponse::message_only(
            StatusCode::OK,
            "Callback processed successfully",
        )),
        StatusWrite::Stale { current_version } => {
            warn!(
                ?expected_version,
                current_version, "Discarding callback for a superseded render"
            );
            Err(ApiError::conflict(
                "Callback is for an outdated render of this project",
            ))
        }
        StatusWrite::Settled { status: earlier } => {
            warn!(?expected_version, "Render already finished as '{}'; ignoring callback", earlier);
            Err(ApiError::conflict(
                "Callback is for a render that already reported its result",
            ))
        }
        StatusWrite::Missing => {
            warn!("Project not found for callback; perhaps already deleted");
            Err(ApiError::not_found("Project not found for callback"))
        }
    }
}
