// handlers/protected/projects/update.rs - PUT /api/projects/:id

use axum::extract::{Path, State};
use serde::Deserialize;
use tracing::{info, instrument};

use super::load_owned_project;
use crate::api::{ApiResponse, ApiResult, ProjectResponse};
use crate::app::AppState;
use crate::database::models::ProjectDetails;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::validate;
use crate::middleware::{AppJson, AuthUser};

const NAME_TAKEN: &str = "Another project with this name already exists for your account";

/// Absent fields are left untouched. Render status and video URL are not editable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub prompt: Option<String>,
}

#[instrument(skip_all, fields(user_id = %user.user_id, project_id = %id))]
pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateProjectRequest>,
) -> ApiResult<ProjectResponse> {
    let project = load_owned_project(&state, &id, user.user_id, "modify").await?;
    let mut details = ProjectDetails::from(&project);

    if let Some(name) = request.name.as_deref().map(str::trim) {
        validate::length_between("name", name, validate::PROJECT_NAME_CHARS)?;
        if name != project.name {
            let clash = state.repo.find_project_by_name(user.user_id, name).await?;
            if clash.is_some_and(|other| other.id != project.id) {
                return Err(ApiError::conflict(NAME_TAKEN));
            }
        }
        details.name = name.to_string();
    }
    if let Some(description) = request.description.as_deref() {
        details.description = description.trim().to_string();
    }
    if let Some(prompt) = request.prompt.as_deref().map(str::trim) {
        validate::min_length("prompt", prompt, validate::PROMPT_MIN_CHARS)?;
        details.prompt = prompt.to_string();
    }

    let updated = state
        .repo
        .update_project_details(project.id, &details)
        .await
        .map_err(|e| match e {
            DatabaseError::NotFound(_) => ApiError::not_found("Manim project not found for update"),
            DatabaseError::Conflict(_) => ApiError::conflict(NAME_TAKEN),
            other => other.into(),
        })?;

    info!("Project {} updated", updated.id);
    Ok(ApiResponse::ok(
        "Manim project updated successfully",
        ProjectResponse::from_project(updated, &state.config.renderer),
    ))
}
