use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::RendererConfig;
use crate::database::models::Project;
use crate::services::rewrite_storage_url;

/// Public wire format of a project.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parent_project_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub render_status: String,
    /// Empty when no video has been recorded.
    pub video_url: String,
    pub render_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectResponse {
    /// Formats a stored project, serving videos recorded on the internal
    /// storage domain from the public one instead.
    pub fn from_project(project: Project, storage: &RendererConfig) -> Self {
        let status = project.status();
        let video_url = status
            .video_url()
            .map(|url| {
                rewrite_storage_url(
                    url,
                    storage.r2_internal_domain.as_deref(),
                    storage.r2_public_domain.as_deref(),
                )
                .unwrap_or_else(|| url.to_string())
            })
            .unwrap_or_default();

        Self {
            id: project.id,
            user_id: project.user_id,
            parent_project_id: project.parent_project_id,
            name: project.name,
            description: project.description,
            prompt: project.prompt,
            render_status: status.as_tag().to_string(),
            video_url,
            render_version: project.render_version,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }

    pub fn from_projects(projects: Vec<Project>, storage: &RendererConfig) -> Vec<Self> {
        projects
            .into_iter()
            .map(|p| Self::from_project(p, storage))
            .collect()
    }
}
