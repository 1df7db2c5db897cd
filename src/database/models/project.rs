use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::RenderStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parent_project_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub render_status: String,
    pub video_url: Option<String>,
    /// Bumped every time a render is started; callbacks must echo it back.
    pub render_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn status(&self) -> RenderStatus {
        RenderStatus::from_stored(&self.render_status, self.video_url.clone())
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Why a status write for render `expected_version` must not touch this row,
    /// or `None` when it may proceed. Unversioned writes always proceed.
    pub fn refuse_status_write(&self, expected_version: Option<i64>) -> Option<StatusWrite> {
        let expected = expected_version?;
        if self.render_version != expected {
            return Some(StatusWrite::Stale {
                current_version: self.render_version,
            });
        }
        let status = self.status();
        if status.is_terminal() {
            return Some(StatusWrite::Settled {
                status: status.as_tag().to_string(),
            });
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: Uuid,
    pub parent_project_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub prompt: String,
}

/// User-editable columns, written together on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetails {
    pub name: String,
    pub description: String,
    pub prompt: String,
}

impl From<&Project> for ProjectDetails {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            description: project.description.clone(),
            prompt: project.prompt.clone(),
        }
    }
}

/// Outcome of a version-guarded render status write.
#[derive(Debug, Clone)]
pub enum StatusWrite {
    Applied(Project),
    /// The row moved on to another render; nothing was written.
    Stale { current_version: i64 },
    /// This render already reported a final status; nothing was written.
    Settled { status: String },
    Missing,
}
