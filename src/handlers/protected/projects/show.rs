// handlers/protected/projects/show.rs - project reads

use axum::extract::{Path, State};
use tracing::{debug, instrument};

use super::load_owned_project;
use crate::api::{ApiResponse, ApiResult, ProjectResponse};
use crate::app::AppState;
use crate::middleware::AuthUser;

/// GET /api/projects - caller's projects, newest first
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<ProjectResponse>> {
    let projects = state.repo.list_projects(user.user_id).await?;
    debug!("Found {} projects", projects.len());

    Ok(ApiResponse::ok(
        "Manim projects retrieved successfully",
        ProjectResponse::from_projects(projects, &state.config.renderer),
    ))
}

/// GET /api/projects/:id
#[instrument(skip_all, fields(user_id = %user.user_id, project_id = %id))]
pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ProjectResponse> {
    let project = load_owned_project(&state, &id, user.user_id, "access").await?;

    Ok(ApiResponse::ok(
        "Manim project retrieved successfully",
        ProjectResponse::from_project(project, &state.config.renderer),
    ))
}

/// GET /api/projects/:id/children - direct sub-projects, oldest first
#[instrument(skip_all, fields(user_id = %user.user_id, project_id = %id))]
pub async fn list_children(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<ProjectResponse>> {
    let parent = load_owned_project(&state, &id, user.user_id, "access").await?;
    let children = state.repo.list_child_projects(parent.id).await?;

    Ok(ApiResponse::ok(
        "Child projects retrieved successfully",
        ProjectResponse::from_projects(children, &state.config.renderer),
    ))
}
