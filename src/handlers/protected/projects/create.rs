// handlers/protected/projects/create.rs - POST /api/projects

use axum::extract::State;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::{ApiResponse, ApiResult, ProjectResponse};
use crate::app::AppState;
use crate::database::models::NewProject;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::validate;
use crate::middleware::{AppJson, AuthUser};

const NAME_TAKEN: &str = "Project with this name already exists for your account";

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt: String,
    /// Optional parent; must be one of the caller's projects.
    #[serde(default)]
    pub parent_project_id: Option<String>,
}

/// POST /api/projects - create a project in `pending` state
///
/// ```json
/// { "name": "Intro", "description": "", "prompt": "A circle morphing into a square",
///   "parent_project_id": null }
/// ```
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateProjectRequest>,
) -> ApiResult<ProjectResponse> {
    let name = request.name.trim().to_string();
    let description = request.description.trim().to_string();
    let prompt = request.prompt.trim().to_string();

    validate::length_between("name", &name, validate::PROJECT_NAME_CHARS)?;
    validate::min_length("prompt", &prompt, validate::PROMPT_MIN_CHARS)?;

    let parent_project_id = match request.parent_project_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(resolve_parent(&state, raw, user.user_id).await?),
    };

    if state
        .repo
        .find_project_by_name(user.user_id, &name)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(NAME_TAKEN));
    }

    let project = state
        .repo
        .create_project(NewProject {
            user_id: user.user_id,
            parent_project_id,
            name,
            description,
            prompt,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::Conflict(_) => ApiError::conflict(NAME_TAKEN),
            other => other.into(),
        })?;

    info!("Project '{}' created with id {}", project.name, project.id);
    Ok(ApiResponse::created(
        "Manim project created successfully",
        ProjectResponse::from_project(project, &state.config.renderer),
    ))
}

async fn resolve_parent(state: &AppState, raw: &str, user_id: Uuid) -> Result<Uuid, ApiError> {
    let parent_id = Uuid::parse_str(raw)
        .map_err(|_| ApiError::field_error("parent_project_id", "must be a valid UUID"))?;

    let parent = state
        .repo
        .find_project(parent_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Parent project not found"))?;

    if !parent.is_owned_by(user_id) {
        return Err(ApiError::forbidden(
            "You do not have permission to use this parent project",
        ));
    }
    Ok(parent.id)
}
