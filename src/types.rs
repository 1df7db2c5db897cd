/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Value the renderer sends in `video_url` when there is no video.
pub const NO_VIDEO_SENTINEL: &str = "N/A";

/// Lifecycle of a project's render job.
///
/// Persisted as a string tag in `manim_projects.render_status`; the URL of a
/// completed render lives in `video_url`. `Failed` keeps the full stored tag,
/// e.g. `failed: code_gen_error` or a status reported verbatim by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderStatus {
    Pending,
    Generating,
    /// `None` when the renderer reported completion without a usable URL.
    Completed(Option<String>),
    Failed(String),
}

impl RenderStatus {
    pub const PENDING: &'static str = "pending";
    pub const GENERATING: &'static str = "generating";
    pub const COMPLETED: &'static str = "completed";

    /// Failure raised by this service at a given pipeline stage.
    pub fn failed_at(stage: &str) -> Self {
        RenderStatus::Failed(format!("failed: {}", stage))
    }

    /// Rebuild from the stored tag and URL columns.
    pub fn from_stored(tag: &str, video_url: Option<String>) -> Self {
        match tag {
            Self::PENDING => RenderStatus::Pending,
            Self::GENERATING => RenderStatus::Generating,
            Self::COMPLETED => RenderStatus::Completed(video_url),
            other => RenderStatus::Failed(other.to_string()),
        }
    }

    /// Interpret a renderer callback. Only `completed` keeps a URL, and only a real one.
    pub fn from_callback(status: &str, video_url: &str) -> Self {
        if status == Self::COMPLETED {
            let url = video_url.trim();
            if url.is_empty() || url == NO_VIDEO_SENTINEL {
                RenderStatus::Completed(None)
            } else {
                RenderStatus::Completed(Some(url.to_string()))
            }
        } else {
            Self::from_stored(status, None)
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            RenderStatus::Pending => Self::PENDING,
            RenderStatus::Generating => Self::GENERATING,
            RenderStatus::Completed(_) => Self::COMPLETED,
            RenderStatus::Failed(tag) => tag,
        }
    }

    pub fn video_url(&self) -> Option<&str> {
        match self {
            RenderStatus::Completed(url) => url.as_deref(),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderStatus::Completed(_) | RenderStatus::Failed(_))
    }
}

impl std::fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}
