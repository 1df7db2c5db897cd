use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::{conflict_on_unique, DatabaseError};
use crate::database::models::{
    MergedVideo, NewProject, NewUser, Project, ProjectDetails, StatusWrite, User,
};
use crate::database::repository::{
    MergedVideoRepository, ProjectRepository, Repository, UserRepository,
};
use crate::types::RenderStatus;

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, user_id, parent_project_id, name, description, prompt, \
     render_status, video_url, render_version, created_at, updated_at";

/// Postgres-backed repository over a shared pool.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "User with email or username already exists"))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProjectRepository for PgRepository {
    async fn create_project(&self, new_project: NewProject) -> Result<Project, DatabaseError> {
        let sql = format!(
            "INSERT INTO manim_projects (user_id, parent_project_id, name, description, prompt, render_status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            PROJECT_COLUMNS
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(new_project.user_id)
            .bind(new_project.parent_project_id)
            .bind(&new_project.name)
            .bind(&new_project.description)
            .bind(&new_project.prompt)
            .bind(RenderStatus::PENDING)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Project name already used by this owner"))
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        let sql = format!("SELECT {} FROM manim_projects WHERE id = $1", PROJECT_COLUMNS);
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_project_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Project>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM manim_projects WHERE user_id = $1 AND name = $2",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM manim_projects WHERE user_id = $1 ORDER BY created_at DESC",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_child_projects(&self, parent_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM manim_projects WHERE parent_project_id = $1 ORDER BY created_at ASC",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_project_details(
        &self,
        id: Uuid,
        details: &ProjectDetails,
    ) -> Result<Project, DatabaseError> {
        let sql = format!(
            "UPDATE manim_projects SET name = $2, description = $3, prompt = $4 \
             WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(&details.name)
            .bind(&details.description)
            .bind(&details.prompt)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Project name already used by this owner"))?
            .ok_or_else(|| DatabaseError::NotFound(format!("project {}", id)))
    }

    async fn delete_project(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM manim_projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn begin_render(&self, id: Uuid) -> Result<i64, DatabaseError> {
        let version: Option<i64> = sqlx::query_scalar(
            "UPDATE manim_projects SET render_status = $2, video_url = NULL, \
             render_version = render_version + 1 WHERE id = $1 RETURNING render_version",
        )
        .bind(id)
        .bind(RenderStatus::GENERATING)
        .fetch_optional(&self.pool)
        .await?;

        version.ok_or_else(|| DatabaseError::NotFound(format!("project {}", id)))
    }

    async fn set_render_status(
        &self,
        id: Uuid,
        status: &RenderStatus,
        expected_version: Option<i64>,
    ) -> Result<StatusWrite, DatabaseError> {
        // A versioned write only lands while that render is still in flight.
        let sql = format!(
            "UPDATE manim_projects SET render_status = $2, video_url = $3 \
             WHERE id = $1 AND ($4::BIGINT IS NULL \
                 OR (render_version = $4 AND render_status IN ($5, $6))) \
             RETURNING {}",
            PROJECT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(status.as_tag())
            .bind(status.video_url())
            .bind(expected_version)
            .bind(RenderStatus::PENDING)
            .bind(RenderStatus::GENERATING)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(project) = updated {
            return Ok(StatusWrite::Applied(project));
        }

        // Nothing matched: the row is gone, its version moved on, or the render finished.
        let Some(current) = self.find_project(id).await? else {
            return Ok(StatusWrite::Missing);
        };
        let refusal = current
            .refuse_status_write(expected_version)
            .unwrap_or(StatusWrite::Stale {
                current_version: current.render_version,
            });
        debug!(%id, ?expected_version, ?refusal, "render status write skipped");
        Ok(refusal)
    }
}

#[async_trait]
impl MergedVideoRepository for PgRepository {
    async fn upsert_merged_video(&self, id: &str, r2_url: &str) -> Result<MergedVideo, DatabaseError> {
        Ok(sqlx::query_as::<_, MergedVideo>(
            "INSERT INTO merged_videos (id, r2_url) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET r2_url = EXCLUDED.r2_url \
             RETURNING id, r2_url",
        )
        .bind(id)
        .bind(r2_url)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;
        Ok(())
    }
}
