//! In-process repository selected with `DATABASE_URL=memory://`.
//!
//! Mirrors the constraints of the Postgres schema: unique emails and
//! usernames, unique project names per owner, cascading user deletes and
//! parent references cleared when a parent project goes away.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    MergedVideo, NewProject, NewUser, Project, ProjectDetails, StatusWrite, User,
};
use crate::database::repository::{
    MergedVideoRepository, ProjectRepository, Repository, UserRepository,
};
use crate::types::RenderStatus;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    merged_videos: HashMap<String, MergedVideo>,
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded merges, sorted by id.
    pub async fn merged_videos(&self) -> Vec<MergedVideo> {
        let tables = self.tables.read().await;
        let mut videos: Vec<MergedVideo> = tables.merged_videos.values().cloned().collect();
        videos.sort_by(|a, b| a.id.cmp(&b.id));
        videos
    }
}

fn name_taken(tables: &Tables, user_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
    tables
        .projects
        .values()
        .any(|p| p.user_id == user_id && p.name == name && Some(p.id) != except)
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|u| u.email == new_user.email || u.username == new_user.username);
        if taken {
            return Err(DatabaseError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }

        let owned: Vec<Uuid> = tables
            .projects
            .values()
            .filter(|p| p.user_id == id)
            .map(|p| p.id)
            .collect();
        for project_id in &owned {
            tables.projects.remove(project_id);
        }
        for project in tables.projects.values_mut() {
            if project.parent_project_id.is_some_and(|parent| owned.contains(&parent)) {
                project.parent_project_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ProjectRepository for MemoryRepository {
    async fn create_project(&self, new_project: NewProject) -> Result<Project, DatabaseError> {
        let mut tables = self.tables.write().await;
        if name_taken(&tables, new_project.user_id, &new_project.name, None) {
            return Err(DatabaseError::Conflict(
                "Project name already used by this owner".to_string(),
            ));
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            user_id: new_project.user_id,
            parent_project_id: new_project.parent_project_id,
            name: new_project.name,
            description: new_project.description,
            prompt: new_project.prompt,
            render_status: RenderStatus::PENDING.to_string(),
            video_url: None,
            render_version: 0,
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn find_project_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Project>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .values()
            .find(|p| p.user_id == user_id && p.name == name)
            .cloned())
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn list_child_projects(&self, parent_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| p.parent_project_id == Some(parent_id))
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    async fn update_project_details(
        &self,
        id: Uuid,
        details: &ProjectDetails,
    ) -> Result<Project, DatabaseError> {
        let mut tables = self.tables.write().await;
        let owner = tables
            .projects
            .get(&id)
            .map(|p| p.user_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("project {}", id)))?;
        if name_taken(&tables, owner, &details.name, Some(id)) {
            return Err(DatabaseError::Conflict(
                "Project name already used by this owner".to_string(),
            ));
        }

        let project = tables
            .projects
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("project {}", id)))?;
        project.name = details.name.clone();
        project.description = details.description.clone();
        project.prompt = details.prompt.clone();
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete_project(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables.projects.get(&id) {
            Some(project) if project.user_id == user_id => {}
            _ => return Ok(false),
        }
        tables.projects.remove(&id);
        for child in tables.projects.values_mut() {
            if child.parent_project_id == Some(id) {
                child.parent_project_id = None;
            }
        }
        Ok(true)
    }

    async fn begin_render(&self, id: Uuid) -> Result<i64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let project = tables
            .projects
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("project {}", id)))?;
        project.render_status = RenderStatus::GENERATING.to_string();
        project.video_url = None;
        project.render_version += 1;
        project.updated_at = Utc::now();
        Ok(project.render_version)
    }

    async fn set_render_status(
        &self,
        id: Uuid,
        status: &RenderStatus,
        expected_version: Option<i64>,
    ) -> Result<StatusWrite, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(project) = tables.projects.get_mut(&id) else {
            return Ok(StatusWrite::Missing);
        };
        if let Some(refusal) = project.refuse_status_write(expected_version) {
            return Ok(refusal);
        }

        project.render_status = status.as_tag().to_string();
        project.video_url = status.video_url().map(str::to_string);
        project.updated_at = Utc::now();
        Ok(StatusWrite::Applied(project.clone()))
    }
}

#[async_trait]
impl MergedVideoRepository for MemoryRepository {
    async fn upsert_merged_video(&self, id: &str, r2_url: &str) -> Result<MergedVideo, DatabaseError> {
        let video = MergedVideo {
            id: id.to_string(),
            r2_url: r2_url.to_string(),
        };
        self.tables
            .write()
            .await
            .merged_videos
            .insert(video.id.clone(), video.clone());
        Ok(video)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
