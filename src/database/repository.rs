use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    MergedVideo, NewProject, NewUser, Project, ProjectDetails, StatusWrite, User,
};
use crate::types::RenderStatus;

/// Credential store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email or username is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Deletes the user and, through the foreign key, every project they own.
    /// Returns `false` when no such user existed.
    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

/// Project store.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// New rows start as `pending` with render version 0. Fails with `Conflict`
    /// when the owner already has a project with that name.
    async fn create_project(&self, new_project: NewProject) -> Result<Project, DatabaseError>;

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, DatabaseError>;

    async fn find_project_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Project>, DatabaseError>;

    /// Newest first.
    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>, DatabaseError>;

    /// Direct children of a project, oldest first.
    async fn list_child_projects(&self, parent_id: Uuid) -> Result<Vec<Project>, DatabaseError>;

    /// Overwrites name, description and prompt. `NotFound` if the row vanished.
    async fn update_project_details(
        &self,
        id: Uuid,
        details: &ProjectDetails,
    ) -> Result<Project, DatabaseError>;

    /// Deletes only when `user_id` owns the row. Children keep existing with
    /// their parent reference cleared.
    async fn delete_project(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError>;

    /// Marks the project `generating` and bumps its render version, returning the new version.
    async fn begin_render(&self, id: Uuid) -> Result<i64, DatabaseError>;

    /// Writes status and video URL. With `expected_version` the write only happens
    /// while the stored render version still matches and has not finished.
    async fn set_render_status(
        &self,
        id: Uuid,
        status: &RenderStatus,
        expected_version: Option<i64>,
    ) -> Result<StatusWrite, DatabaseError>;
}

/// Merge results, keyed by the renderer's merged video id.
#[async_trait]
pub trait MergedVideoRepository: Send + Sync {
    async fn upsert_merged_video(&self, id: &str, r2_url: &str) -> Result<MergedVideo, DatabaseError>;
}

/// Everything the HTTP layer needs from storage.
#[async_trait]
pub trait Repository: UserRepository + ProjectRepository + MergedVideoRepository {
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
