// handlers/protected/projects/delete.rs - DELETE /api/projects/:id

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use super::load_owned_project;
use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Sub-projects survive with their parent reference cleared.
#[instrument(skip_all, fields(user_id = %user.user_id, project_id = %id))]
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let project = load_owned_project(&state, &id, user.user_id, "delete").await?;

    // Owner-scoped delete; a concurrent delete shows up as zero rows.
    if !state.repo.delete_project(project.id, user.user_id).await? {
        return Err(ApiError::not_found("Manim project not found"));
    }

    info!("Project {} deleted", project.id);
    Ok(ApiResponse::message_only(
        StatusCode::OK,
        "Manim project deleted successfully",
    ))
}
