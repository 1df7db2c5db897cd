// handlers/protected/projects/mod.rs - Project handlers (JWT required)
//
// Every handler resolves the project first and answers 404 before 403, so a
// foreign project is distinguishable from a missing one.

use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Project;
use crate::error::ApiError;
use crate::handlers::validate;

pub mod create; // POST /api/projects
pub mod delete; // DELETE /api/projects/:id
pub mod render; // POST /api/projects/:id/generate-render
pub mod show;   // GET /api/projects, /api/projects/:id, /api/projects/:id/children
pub mod update; // PUT /api/projects/:id

pub use create::create_project;
pub use delete::delete_project;
pub use render::generate_render;
pub use show::{get_project, list_children, list_projects};
pub use update::update_project;

/// Fetches the project named by a raw path id and checks `user_id` owns it.
/// `action` completes "You do not have permission to ... this project".
pub(crate) async fn load_owned_project(
    state: &AppState,
    raw_id: &str,
    user_id: Uuid,
    action: &str,
) -> Result<Project, ApiError> {
    let project_id = validate::project_id(raw_id)?;

    let project = state
        .repo
        .find_project(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Manim project not found"))?;

    if !project.is_owned_by(user_id) {
        tracing::warn!(
            "User {} attempted to {} project {} owned by {}",
            user_id,
            action,
            project.id,
            project.user_id
        );
        return Err(ApiError::forbidden(format!(
            "You do not have permission to {} this project",
            action
        )));
    }

    Ok(project)
}
